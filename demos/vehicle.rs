//! A small vehicle hierarchy declared with `nested_enum!`.
//!
//! This example shows how to:
//! - Declare nested enumerations with ids, ordinals and linked types
//! - Filter a node's entries by Inner/Outer
//! - Look values up by name, id and integer, locally and recursively

use nested_enum::{LinkedEntry, NestedEnum, Selection};
use nested_enum_macro::nested_enum;

pub struct Hatchback;

nested_enum! {
    #[prefix = "Garage"]
    #[repr(u16)]
    pub enum Vehicle {
        Land {
            Bike;
            Car {
                Subcompact;
                #[id = "C-segment"]
                Compact<crate::Hatchback>;
                Suv = 10;
            }
        }
        #[id = "boat"]
        Watercraft = 20;
        Aircraft { .. }
    }

    #[repr(i8)]
    enum Vehicle::Aircraft {
        Jet = -1;
        Glider;
    }
}

fn main() {
    println!("=== Vehicle Example ===\n");

    // 1. Values and their integers
    println!("Root entries:");
    for value in Vehicle::Value::values(Selection::All) {
        println!("  {:<12} = {}", format!("{value:?}"), value.integer());
    }
    println!();

    // 2. Inner entries expand into branching children, Outer ones do not
    println!("Inner: {:?}", Vehicle::Value::names(Selection::Inner, true));
    println!("Outer: {:?}", Vehicle::Value::names(Selection::Outer, true));
    println!();

    // 3. Local lookups
    println!("Local lookups on Vehicle::Land::Car:");
    let compact = Vehicle::Land::Car::Value::from_id("C-segment");
    println!("  by id 'C-segment'   → {:?}", compact);
    println!("  Suv integer          = {}", Vehicle::Land::Car::Suv.integer());
    println!("  from integer 10      → {:?}", Vehicle::Land::Car::Value::from_integer(10));
    println!(
        "  Compact linked type  = {}",
        <Vehicle::Land::Car::Compact::Entry as LinkedEntry>::linked_type_name()
    );
    println!();

    // 4. Recursive lookups from the root
    println!("Recursive lookups from Vehicle:");
    println!(
        "  name of Compact      = {:?}",
        Vehicle::Value::name_recursive(Vehicle::Land::Car::Compact, false)
    );
    println!(
        "  name of id 'boat'    = {:?}",
        Vehicle::Value::name_by_id_recursive("boat", true)
    );
    println!("  Jet                  = {}", Vehicle::Aircraft::Jet);
    println!(
        "  all values           = {}",
        Vehicle::Value::count_recursive(Selection::All)
    );
    println!();

    // 5. Whole-tree view through the runtime tables
    println!("Nodes ({}):", Vehicle::NODE_COUNT);
    for node in Vehicle::tree().nodes() {
        println!(
            "  {:<28} leaf={:<5} entries={}",
            node.qualified_name(false),
            node.is_leaf(),
            node.count(Selection::All)
        );
    }
}
