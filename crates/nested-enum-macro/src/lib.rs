use proc_macro::TokenStream;
use proc_macro2::{Literal, Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{braced, token, Ident, LitInt, LitStr, Result, Token, Type, Visibility};

use nested_enum::{
    BranchPolicy, BuildOptions, ChildDef, DeferredDef, EntryDef, EnumTree, IntType, NodeDef,
    NodeRef, Override, TreeDef, UnknownIntType,
};
use proc_macro_crate::{crate_name, FoundCrate};

/// Entry names that would collide with generated items.
const RESERVED: &[&str] = &["Value", "Entry", "tree", "definition", "OPTIONS", "NODE_COUNT"];

// =============================================================================
// Parsing
// =============================================================================

/// Raw attribute: `#[key]`, `#[key = "lit"]` or `#[key(ident)]`.
struct Attr {
    key: Ident,
    value: AttrValue,
}

enum AttrValue {
    Flag,
    Str(LitStr),
    Paren(Ident),
}

/// Attributes accepted on the root enum.
#[derive(Default)]
struct RootAttrs {
    prefix: Option<String>,
    repr: Option<IntType>,
    default_repr: Option<IntType>,
    allow_ambiguous: bool,
    policy: Option<BranchPolicy>,
}

/// Attributes accepted on an entry.
#[derive(Default)]
struct EntryAttrs {
    id: Option<LitStr>,
    /// Underlying type of the entry's child node.
    repr: Option<(IntType, Span)>,
}

enum Body {
    /// `Name;`
    Leaf,
    /// `Name { ... }`
    Inline(Vec<EntrySyntax>),
    /// `Name { .. }`, body given later as `enum Root::Name { ... }`
    Deferred,
}

struct EntrySyntax {
    name: Ident,
    attrs: EntryAttrs,
    /// Optional: Name<LinkedType>
    linked: Option<Type>,
    ordinal: Option<Override>,
    body: Body,
}

struct DeferredSyntax {
    repr: Option<IntType>,
    path: Vec<Ident>,
    entries: Vec<EntrySyntax>,
}

struct EnumInput {
    attrs: RootAttrs,
    vis: Visibility,
    root: Ident,
    entries: Vec<EntrySyntax>,
    deferred: Vec<DeferredSyntax>,
}

impl Parse for EnumInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let attrs = RootAttrs::from_attrs(parse_attrs(input)?)?;
        let vis: Visibility = input.parse()?;
        input.parse::<Token![enum]>()?;
        let root: Ident = input.parse()?;
        let content;
        braced!(content in input);
        let entries = parse_entries(&content)?;

        // Deferred bodies: `enum Root::Path::Name { ... }`
        let mut deferred = Vec::new();
        while !input.is_empty() {
            let attrs = EntryAttrs::from_attrs(parse_attrs(input)?)?;
            if let Some(id) = attrs.id {
                return Err(syn::Error::new(
                    id.span(),
                    "`id` belongs on the entry, not on its deferred body",
                ));
            }
            input.parse::<Token![enum]>()?;
            let path = Punctuated::<Ident, Token![::]>::parse_separated_nonempty(input)?;
            let content;
            braced!(content in input);
            deferred.push(DeferredSyntax {
                repr: attrs.repr.map(|(ty, _)| ty),
                path: path.into_iter().collect(),
                entries: parse_entries(&content)?,
            });
        }

        Ok(Self {
            attrs,
            vis,
            root,
            entries,
            deferred,
        })
    }
}

fn parse_attrs(input: ParseStream) -> Result<Vec<Attr>> {
    let mut attrs = Vec::new();
    while input.peek(Token![#]) {
        input.parse::<Token![#]>()?;
        let content;
        syn::bracketed!(content in input);

        let key: Ident = content.parse()?;
        let value = if content.peek(Token![=]) {
            content.parse::<Token![=]>()?;
            AttrValue::Str(content.parse()?)
        } else if content.peek(token::Paren) {
            let inner;
            syn::parenthesized!(inner in content);
            AttrValue::Paren(inner.parse()?)
        } else {
            AttrValue::Flag
        };
        if !content.is_empty() {
            return Err(content.error("unexpected tokens in attribute"));
        }
        attrs.push(Attr { key, value });
    }
    Ok(attrs)
}

fn parse_int_type(ident: &Ident) -> Result<IntType> {
    ident
        .to_string()
        .parse()
        .map_err(|err: UnknownIntType| syn::Error::new(ident.span(), err))
}

impl RootAttrs {
    fn from_attrs(attrs: Vec<Attr>) -> Result<Self> {
        let mut result = Self::default();
        for attr in attrs {
            match (attr.key.to_string().as_str(), attr.value) {
                ("prefix", AttrValue::Str(lit)) => result.prefix = Some(lit.value()),
                ("repr", AttrValue::Paren(ty)) => result.repr = Some(parse_int_type(&ty)?),
                ("default_repr", AttrValue::Paren(ty)) => {
                    result.default_repr = Some(parse_int_type(&ty)?)
                }
                ("allow_ambiguous", AttrValue::Flag) => result.allow_ambiguous = true,
                ("policy", AttrValue::Str(lit)) => {
                    let policy = lit
                        .value()
                        .parse()
                        .map_err(|err: String| syn::Error::new(lit.span(), err))?;
                    result.policy = Some(policy);
                }
                ("doc", _) => {}
                (key, _) => {
                    return Err(syn::Error::new(
                        attr.key.span(),
                        format!("unsupported root attribute `{key}`"),
                    ));
                }
            }
        }
        Ok(result)
    }
}

impl EntryAttrs {
    fn from_attrs(attrs: Vec<Attr>) -> Result<Self> {
        let mut result = Self::default();
        for attr in attrs {
            match (attr.key.to_string().as_str(), attr.value) {
                ("id", AttrValue::Str(lit)) => result.id = Some(lit),
                ("repr", AttrValue::Paren(ty)) => {
                    result.repr = Some((parse_int_type(&ty)?, ty.span()))
                }
                ("doc", _) => {}
                (key, _) => {
                    return Err(syn::Error::new(
                        attr.key.span(),
                        format!("unsupported entry attribute `{key}`"),
                    ));
                }
            }
        }
        Ok(result)
    }
}

/// `= 5`, `= -3` or `= 5u64`. A suffix is checked against the node's type.
fn parse_ordinal(input: ParseStream) -> Result<Override> {
    let negative = input.peek(Token![-]);
    if negative {
        input.parse::<Token![-]>()?;
    }
    let lit: LitInt = input.parse()?;
    let magnitude: i128 = lit.base10_parse()?;
    let ty = match lit.suffix() {
        "" => None,
        suffix => Some(
            suffix
                .parse()
                .map_err(|err: UnknownIntType| syn::Error::new(lit.span(), err))?,
        ),
    };
    Ok(Override {
        value: if negative { -magnitude } else { magnitude },
        ty,
    })
}

fn parse_entries(input: ParseStream) -> Result<Vec<EntrySyntax>> {
    let mut entries = Vec::new();
    while !input.is_empty() {
        let attrs = EntryAttrs::from_attrs(parse_attrs(input)?)?;

        let name: Ident = input.parse()?;
        if RESERVED.contains(&name.to_string().as_str()) {
            return Err(syn::Error::new(
                name.span(),
                format!("`{name}` is reserved for generated items"),
            ));
        }

        // Optional linked type: Name<Type>
        let linked = if input.peek(Token![<]) {
            input.parse::<Token![<]>()?;
            let ty: Type = input.parse()?;
            input.parse::<Token![>]>()?;
            Some(ty)
        } else {
            None
        };

        let ordinal = if input.peek(Token![=]) {
            input.parse::<Token![=]>()?;
            Some(parse_ordinal(input)?)
        } else {
            None
        };

        let body = if input.peek(token::Brace) {
            let content;
            braced!(content in input);
            if content.peek(Token![..]) {
                content.parse::<Token![..]>()?;
                if !content.is_empty() {
                    return Err(content.error("expected `}` after `..`"));
                }
                Body::Deferred
            } else {
                Body::Inline(parse_entries(&content)?)
            }
        } else {
            input.parse::<Token![;]>()?;
            Body::Leaf
        };

        if let Some((_, span)) = attrs.repr {
            match body {
                Body::Leaf => {
                    return Err(syn::Error::new(
                        span,
                        "`repr` on an entry sets its child's type; this entry has no child",
                    ));
                }
                Body::Deferred => {
                    return Err(syn::Error::new(
                        span,
                        "put `repr` on the deferred body instead",
                    ));
                }
                Body::Inline(_) => {}
            }
        }

        entries.push(EntrySyntax {
            name,
            attrs,
            linked,
            ordinal,
            body,
        });
    }
    Ok(entries)
}

// =============================================================================
// Lowering to the IR
// =============================================================================

impl EnumInput {
    fn options(&self) -> BuildOptions {
        BuildOptions {
            default_underlying: self.attrs.default_repr.unwrap_or_default(),
            branch_policy: self.attrs.policy.unwrap_or_default(),
            allow_ambiguous: self.attrs.allow_ambiguous,
        }
    }

    fn to_tree_def(&self) -> TreeDef {
        let mut root = NodeDef::new(self.root.to_string());
        root.underlying = self.attrs.repr;
        root.prefix = self.attrs.prefix.clone();
        root.entries = entry_defs(&self.entries);

        let mut def = TreeDef::new(root);
        for body in &self.deferred {
            let Some((name, parents)) = body.path.split_last() else {
                continue;
            };
            let mut segments: Vec<String> = self
                .attrs
                .prefix
                .iter()
                .filter(|p| !p.is_empty())
                .cloned()
                .collect();
            segments.extend(parents.iter().map(Ident::to_string));

            let mut node = NodeDef::new(name.to_string());
            node.underlying = body.repr;
            node.entries = entry_defs(&body.entries);
            def.deferred.push(DeferredDef {
                parent: segments.join("::"),
                node,
            });
        }
        def
    }
}

fn entry_defs(entries: &[EntrySyntax]) -> Vec<EntryDef> {
    entries
        .iter()
        .map(|entry| {
            let name = entry.name.to_string();
            let child = match &entry.body {
                Body::Leaf => None,
                Body::Inline(children) => Some(ChildDef::Inline(NodeDef {
                    name: name.clone(),
                    underlying: entry.attrs.repr.map(|(ty, _)| ty),
                    prefix: None,
                    entries: entry_defs(children),
                })),
                Body::Deferred => Some(ChildDef::Deferred),
            };
            EntryDef {
                name,
                ordinal: entry.ordinal,
                id: entry.attrs.id.as_ref().map(LitStr::value),
                linked: entry.linked.as_ref().map(type_path_string),
                child,
            }
        })
        .collect()
}

/// `crate :: Hatchback < u8 >` → `crate::Hatchback<u8>`
fn type_path_string(ty: &Type) -> String {
    quote!(#ty)
        .to_string()
        .replace(" :: ", "::")
        .replace(":: ", "::")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
}

// =============================================================================
// Crate path resolution
// =============================================================================

fn nested_enum_crate_path() -> TokenStream2 {
    match crate_name("nested-enum") {
        Ok(FoundCrate::Itself) => quote!(::nested_enum),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(_) => quote!(::nested_enum),
    }
}

// =============================================================================
// Code generation
// =============================================================================

/// Unsuffixed literal; the surrounding context fixes its type.
fn int_literal(value: i128) -> TokenStream2 {
    let lit = Literal::u128_unsuffixed(value.unsigned_abs());
    if value < 0 { quote!(-#lit) } else { quote!(#lit) }
}

fn option_str(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(s) => quote!(::core::option::Option::Some(#s)),
        None => quote!(::core::option::Option::None),
    }
}

fn entry_ident(name: &str) -> Result<Ident> {
    syn::parse_str(name)
}

/// Generate the contents of one node's module.
///
/// Layout, for a node `Land { Car; Truck; }`:
///
/// ```ignore
/// pub struct Value(i32);                 // the node's value type
/// impl Value { pub const Car: Self; pub const Truck: Self; }
/// pub const Car: Value; pub const Truck: Value;
/// impl NestedEnum for Value { .. }
/// pub mod Car { pub struct Entry; /* child node, if any */ }
/// pub mod Truck { pub struct Entry; }
/// ```
///
/// A child node's contents go into its entry's module, so `Vehicle::Land::Value`
/// is the child type and `Vehicle::Land::Entry` the marker for `Vehicle::Land`.
fn generate_node(node: NodeRef<'_>, krate: &TokenStream2) -> Result<TokenStream2> {
    let int = Ident::new(node.underlying().as_str(), Span::call_site());
    let qualified_name = node.qualified_name(false);
    let index = Literal::usize_unsuffixed(node.node_id().index());
    let is_leaf = node.is_leaf();
    let supers: Vec<TokenStream2> = (0..node.depth()).map(|_| quote!(super::)).collect();

    let mut idents = Vec::new();
    let mut ints = Vec::new();
    let mut names = Vec::new();
    let mut ids = Vec::new();
    let mut modules = Vec::new();

    for entry in node.entries() {
        let ident = entry_ident(entry.name(true))?;
        let linked = match entry.linked() {
            Some(path) => {
                let ty: Type = syn::parse_str(path)?;
                quote!(#ty)
            }
            None => quote!(super::Value),
        };
        let child = match entry.child() {
            Some(child) => generate_node(child, krate)?,
            None => TokenStream2::new(),
        };
        let doc = format!("Entry marker for `{}`.", entry.name(false));

        modules.push(quote! {
            pub mod #ident {
                use super::*;

                #[doc = #doc]
                #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
                pub struct Entry;

                impl #krate::LinkedEntry for Entry {
                    type Owner = super::Value;
                    type Linked = #linked;
                    const VALUE: super::Value = super::Value::#ident;
                }

                #child
            }
        });

        idents.push(ident);
        ints.push(int_literal(entry.integer()));
        names.push(entry.name(false));
        ids.push(option_str(entry.id()));
    }

    let value_doc = format!("Value of `{qualified_name}`.");

    Ok(quote! {
        #[doc = #value_doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct Value(#int);

        impl Value {
            #(pub const #idents: Self = Self(#ints);)*
        }

        // Module-level convenience constants
        #(pub const #idents: Value = Value::#idents;)*

        impl #krate::NestedEnum for Value {
            type Underlying = #int;

            const QUALIFIED_NAME: &'static str = #qualified_name;
            const NODE: #krate::NodeId = #krate::NodeId::new(#index);
            const IS_LEAF: bool = #is_leaf;
            const VALUES: &'static [Self] = &[#(Self::#idents),*];
            const INTEGERS: &'static [#int] = &[#(#ints),*];
            const NAMES: &'static [&'static str] = &[#(#names),*];
            const IDS: &'static [::core::option::Option<&'static str>] = &[#(#ids),*];

            fn tree() -> &'static #krate::EnumTree {
                #(#supers)* tree()
            }

            #[inline]
            fn integer(self) -> #int {
                self.0
            }
        }

        impl ::core::fmt::Debug for Value {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match <Self as #krate::NestedEnum>::name(*self, true) {
                    ::core::option::Option::Some(name) => f.write_str(name),
                    ::core::option::Option::None => f.debug_tuple("Value").field(&self.0).finish(),
                }
            }
        }

        impl ::core::fmt::Display for Value {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match <Self as #krate::NestedEnum>::name(*self, false) {
                    ::core::option::Option::Some(name) => f.write_str(name),
                    ::core::option::Option::None => ::core::write!(f, "{}({})", #qualified_name, self.0),
                }
            }
        }

        impl ::core::convert::From<Value> for #krate::EnumValue {
            fn from(value: Value) -> Self {
                #krate::NestedEnum::to_value(value)
            }
        }

        impl ::core::convert::TryFrom<#krate::EnumValue> for Value {
            type Error = #krate::EnumValue;

            fn try_from(value: #krate::EnumValue) -> ::core::result::Result<Self, Self::Error> {
                <Self as #krate::NestedEnum>::from_value(value).ok_or(value)
            }
        }

        #(#modules)*
    })
}

/// Rebuild a node as IR with every ordinal resolved and deferred bodies inlined.
fn definition_tokens(node: NodeRef<'_>, krate: &TokenStream2) -> TokenStream2 {
    let name = node.name();
    let underlying = Ident::new(&format!("{:?}", node.underlying()), Span::call_site());
    let prefix = node
        .is_root()
        .then(|| node.global_prefix())
        .flatten()
        .map(|prefix| quote!(.prefix(#prefix)));

    let entries = node.entries().map(|entry| {
        let entry_name = entry.name(true);
        let ordinal = int_literal(entry.integer());
        let id = entry.id().map(|id| quote!(.id(#id)));
        let linked = entry.linked().map(|linked| quote!(.linked(#linked)));
        let child = entry.child().map(|child| {
            let child = definition_tokens(child, krate);
            quote!(.child(#child))
        });
        quote! {
            #krate::EntryDef::new(#entry_name)
                .ordinal(#krate::Override::new(#ordinal))
                #id #linked #child
        }
    });

    quote! {
        #krate::NodeDef::new(#name)
            .underlying(#krate::IntType::#underlying)
            #prefix
            #(.entry(#entries))*
    }
}

fn expand(input: &EnumInput, krate: &TokenStream2) -> Result<TokenStream2> {
    // 1. Lower and validate; a malformed tree never produces code
    let def = input.to_tree_def();
    let options = input.options();
    let tree = EnumTree::build(&def, &options)
        .map_err(|err| syn::Error::new(input.root.span(), err))?;
    let root = tree.root();

    // 2. Per-node modules
    let contents = generate_node(root, krate)?;

    // 3. Runtime tree
    let definition = definition_tokens(root, krate);
    let node_count = tree.len();
    let qualified_name = root.qualified_name(false);
    let default_underlying = Ident::new(
        &format!("{:?}", options.default_underlying),
        Span::call_site(),
    );
    let branch_policy = Ident::new(&format!("{:?}", options.branch_policy), Span::call_site());
    let allow_ambiguous = options.allow_ambiguous;

    // 4. Assemble
    let vis = &input.vis;
    let root_ident = &input.root;

    Ok(quote! {
        #[allow(non_snake_case, non_upper_case_globals, unused_imports, dead_code)]
        #vis mod #root_ident {
            use super::*;

            /// Number of nodes in this hierarchy, root included.
            pub const NODE_COUNT: usize = #node_count;

            /// Options the hierarchy was validated with.
            pub const OPTIONS: #krate::BuildOptions = #krate::BuildOptions {
                default_underlying: #krate::IntType::#default_underlying,
                branch_policy: #krate::BranchPolicy::#branch_policy,
                allow_ambiguous: #allow_ambiguous,
            };

            /// Declarative form of this hierarchy with every ordinal resolved.
            pub fn definition() -> #krate::TreeDef {
                #krate::TreeDef::new(#definition)
            }

            /// Runtime tables, built on first use.
            pub fn tree() -> &'static #krate::EnumTree {
                static TREE: ::std::sync::OnceLock<#krate::EnumTree> = ::std::sync::OnceLock::new();
                TREE.get_or_init(|| {
                    // Validated during expansion; rebuilding the same definition cannot fail.
                    #krate::EnumTree::build(&definition(), &OPTIONS)
                        .unwrap_or_else(|err| panic!("{}: {}", #qualified_name, err))
                })
            }

            #contents
        }
    })
}

// =============================================================================
// Entry point
// =============================================================================

/// Declare a hierarchy of enumerations.
///
/// ```ignore
/// nested_enum! {
///     #[prefix = "Category"]
///     #[repr(u32)]
///     pub enum Vehicle {
///         #[repr(u64)]
///         Land { Car; Truck; }
///         Watercraft = 5;
///         #[id = "C-segment"]
///         Compact<crate::Hatchback>;
///         Placeholder {}
///         Aircraft { .. }
///     }
///
///     enum Vehicle::Aircraft { Jet; Glider; }
/// }
///
/// use nested_enum::{NestedEnum, Selection};
/// assert_eq!(Vehicle::Value::count(Selection::Inner), 2);
/// assert_eq!(Vehicle::Land::Value::Car.name(false), Some("Category::Vehicle::Land::Car"));
/// ```
///
/// Root attributes: `prefix`, `repr`, `default_repr`, `allow_ambiguous`,
/// `policy = "non_empty" | "nested"`. Entry attributes: `id`, and `repr` for
/// the entry's child. Any definition error is reported as a compile error.
#[proc_macro]
pub fn nested_enum(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as EnumInput);
    let krate = nested_enum_crate_path();
    expand(&input, &krate)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
