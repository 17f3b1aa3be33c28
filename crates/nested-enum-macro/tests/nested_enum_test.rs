use nested_enum::{EnumTree, EnumValue, LinkedEntry, NestedEnum, Selection};
use nested_enum_macro::nested_enum;
use pretty_assertions::assert_eq;

pub struct Hatchback;

nested_enum! {
    pub enum Vehicle {
        Land { Car; Truck; }
        Watercraft;
    }
}

nested_enum! {
    #[repr(u8)]
    pub enum Car {
        Subcompact;
        #[id = "C-segment"]
        Compact<crate::Hatchback>;
        Suv = 10 { Small; Large; }
    }
}

nested_enum! {
    #[prefix = "Category"]
    #[repr(u32)]
    pub enum Fleet {
        #[repr(u64)]
        Land { Car = 3u64; Truck; }
        #[id = "W"]
        Watercraft = 5;
        Placeholder {}
        Aircraft { .. }
    }

    #[repr(i8)]
    enum Fleet::Aircraft {
        Jet = -128;
        Glider;
        #[id = "balloon"]
        Balloon = 0;
    }
}

nested_enum! {
    #[allow_ambiguous]
    pub enum Codes {
        #[id = "x"]
        A;
        B { #[id = "x"] C; }
    }
}

nested_enum! {
    #[policy = "nested"]
    pub enum Strict {
        Land { Car; }
        Deep { Sub { X; } }
        Plain;
    }
}

fn assert_linked<E, T>()
where
    E: LinkedEntry<Linked = T>,
    T: ?Sized,
{
}

// =============================================================================
// Two-level vehicle tree
// =============================================================================

#[test]
fn vehicle_counts() {
    assert_eq!(Vehicle::Value::count(Selection::All), 2);
    assert_eq!(Vehicle::Value::count(Selection::Inner), 1);
    assert_eq!(Vehicle::Value::count(Selection::Outer), 1);
    assert_eq!(Vehicle::Value::count_recursive(Selection::All), 4);
    assert_eq!(Vehicle::NODE_COUNT, 2);
}

#[test]
fn vehicle_values_and_names() {
    assert_eq!(
        Vehicle::Land::Value::values(Selection::All),
        [Vehicle::Land::Car, Vehicle::Land::Truck]
    );
    assert_eq!(Vehicle::Land::Car.integer(), 0);
    assert_eq!(Vehicle::Land::Truck.integer(), 1);
    assert_eq!(Vehicle::Watercraft.integer(), 1);
    assert_eq!(
        Vehicle::Value::name_recursive(Vehicle::Land::Car, false),
        Some("Vehicle::Land::Car")
    );
    assert_eq!(
        Vehicle::Value::names_recursive(Selection::All, true),
        ["Land", "Watercraft", "Car", "Truck"]
    );
}

#[test]
fn vehicle_entry_markers() {
    assert_eq!(<Vehicle::Land::Entry as LinkedEntry>::VALUE, Vehicle::Land);
    assert_linked::<Vehicle::Watercraft::Entry, Vehicle::Value>();
    assert_linked::<Vehicle::Land::Car::Entry, Vehicle::Land::Value>();
}

// =============================================================================
// Ids and linked types
// =============================================================================

#[test]
fn compact_id() {
    assert_eq!(Car::Compact.id(), Some("C-segment"));
    assert_eq!(Car::Value::from_id("C-segment"), Some(Car::Compact));
    assert_eq!(Car::Subcompact.id(), None);
    assert_eq!(Car::Value::name_by_id("C-segment", true), Some("Compact"));
    assert_eq!(Car::Value::id_by_name("Car::Compact"), Some("C-segment"));
    assert_eq!(Car::Value::from_name("Car::Suv"), Some(Car::Suv));
}

#[test]
fn compact_linked_type() {
    assert_linked::<Car::Compact::Entry, Hatchback>();
    assert_linked::<Car::Subcompact::Entry, Car::Value>();
    assert!(<Car::Compact::Entry as LinkedEntry>::linked_type_name().ends_with("Hatchback"));
    assert_eq!(Car::Compact.linked_type(), Some("crate::Hatchback"));
    assert_eq!(Car::Subcompact.linked_type(), Some("Car"));
}

#[test]
fn ordinal_override_with_child() {
    let integers: &[u8] = Car::Value::INTEGERS;
    assert_eq!(integers, &[0, 1, 10]);
    assert_eq!(Car::Value::from_integer(10), Some(Car::Suv));
    assert_eq!(Car::Value::from_integer(2), None);
    assert_eq!(Car::Suv::Value::names(Selection::All, false), ["Car::Suv::Small", "Car::Suv::Large"]);
    assert_eq!(Car::Value::values(Selection::Inner), [Car::Suv]);
}

// =============================================================================
// Prefix, typed ordinals, placeholder and deferred children
// =============================================================================

#[test]
fn fleet_names_and_formatting() {
    assert_eq!(Fleet::Value::QUALIFIED_NAME, "Category::Fleet");
    assert_eq!(Fleet::Value::qualified_name(true), "Fleet");
    assert_eq!(Fleet::Value::global_prefix(), Some("Category"));
    assert_eq!(Fleet::Land::Value::global_prefix(), Some("Category"));
    assert_eq!(Fleet::Land::Car.to_string(), "Category::Fleet::Land::Car");
    assert_eq!(format!("{:?}", Fleet::Land::Car), "Car");
}

#[test]
fn fleet_ordinals() {
    let root: &[u32] = Fleet::Value::INTEGERS;
    assert_eq!(root, &[0, 5, 6, 7]);
    let land: &[u64] = Fleet::Land::Value::INTEGERS;
    assert_eq!(land, &[3, 4]);
    let aircraft: &[i8] = Fleet::Aircraft::Value::INTEGERS;
    assert_eq!(aircraft, &[-128, -127, 0]);
}

#[test]
fn fleet_classification() {
    assert_eq!(
        Fleet::Value::names(Selection::Inner, true),
        ["Land", "Aircraft"]
    );
    assert_eq!(
        Fleet::Value::names(Selection::Outer, true),
        ["Watercraft", "Placeholder"]
    );
    assert!(Fleet::Placeholder::Value::IS_LEAF);
    assert_eq!(Fleet::Placeholder::Value::count(Selection::All), 0);
    assert!(!Fleet::Aircraft::Value::IS_LEAF);
}

#[test]
fn deferred_child_is_part_of_the_tree() {
    assert_eq!(
        Fleet::Aircraft::Value::names(Selection::All, true),
        ["Jet", "Glider", "Balloon"]
    );
    assert_eq!(
        Fleet::Value::name_by_id_recursive("balloon", false),
        Some("Category::Fleet::Aircraft::Balloon")
    );
    assert!(Fleet::Value::contains_node::<Fleet::Aircraft::Value>());
    assert!(!Fleet::Aircraft::Value::contains_node::<Fleet::Land::Value>());
}

#[test]
fn untyped_round_trip() {
    let value: EnumValue = Fleet::Land::Car.into();
    assert_eq!(value.integer(), 3);
    assert_eq!(Fleet::Land::Value::try_from(value), Ok(Fleet::Land::Car));
    assert_eq!(Fleet::Value::try_from(value), Err(value));
    assert_eq!(
        Fleet::Value::value_by_name_recursive("Category::Fleet::Land::Truck"),
        Some(Fleet::Land::Truck.to_value())
    );
}

#[test]
fn values_of_another_tree_are_not_found() {
    // Car's root and Vehicle's root are both node 0 of their own tree.
    assert_eq!(Vehicle::Value::name_recursive(Car::Compact, false), None);
    assert_eq!(Vehicle::Value::id_recursive(Car::Compact), None);
    assert_eq!(Car::Value::id_recursive(Car::Compact), Some("C-segment"));
    assert!(!Vehicle::Value::contains_node::<Car::Value>());
}

#[test]
fn conversion_rejects_values_of_another_tree() {
    let land: EnumValue = Vehicle::Land.into();
    assert_eq!(Car::Value::from_value(land), None);
    assert_eq!(Car::Value::try_from(land), Err(land));
    assert_eq!(Vehicle::Value::try_from(land), Ok(Vehicle::Land));
}

#[test]
fn definition_rebuilds_the_same_tables() {
    let rebuilt = EnumTree::build(&Fleet::definition(), &Fleet::OPTIONS).unwrap();
    let tree = Fleet::tree();
    assert_eq!(rebuilt.len(), tree.len());
    for (a, b) in rebuilt.nodes().zip(tree.nodes()) {
        assert_eq!(a.qualified_name(false), b.qualified_name(false));
        assert_eq!(a.integers(Selection::All), b.integers(Selection::All));
        assert_eq!(a.ids(Selection::All), b.ids(Selection::All));
        assert_eq!(a.is_leaf(), b.is_leaf());
    }
}

#[test]
fn const_tables_match_runtime_tables() {
    fn check<T: NestedEnum>() {
        let node = T::node();
        assert_eq!(node.qualified_name(false), T::QUALIFIED_NAME);
        assert_eq!(node.names(Selection::All, false), T::NAMES);
        assert_eq!(node.ids(Selection::All), T::IDS);
        assert_eq!(node.is_leaf(), T::IS_LEAF);
        assert_eq!(T::VALUES.len(), T::count(Selection::All));
        for value in T::VALUES {
            assert_eq!(T::from_value(value.to_value()), T::from_integer(value.integer()));
        }
    }
    check::<Fleet::Value>();
    check::<Fleet::Land::Value>();
    check::<Fleet::Placeholder::Value>();
    check::<Fleet::Aircraft::Value>();
    check::<Car::Value>();
    check::<Car::Suv::Value>();
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn ambiguous_ids_resolve_to_first_in_preorder() {
    assert!(Codes::OPTIONS.allow_ambiguous);
    assert_eq!(Codes::Value::name_by_id_recursive("x", false), Some("Codes::A"));
    assert_eq!(Codes::B::Value::name_by_id_recursive("x", true), Some("C"));
}

#[test]
fn nested_policy() {
    assert_eq!(Strict::Value::names(Selection::Inner, true), ["Deep"]);
    assert!(Strict::Land::Value::IS_LEAF);
    assert!(!Strict::Deep::Value::IS_LEAF);
    assert_eq!(Strict::Value::count_recursive(Selection::Inner), 1);
}
