//! IR attribute store
//!
//! Facts synthesized during lowering ("this property is initialized in the
//! constructor body", "this file needs an import") live here, keyed by the
//! owning node's identity, instead of in the IR node types.
//!
//! Declarations resolve through their `original` link: a copied function or
//! parameter reads and writes the slots of the declaration it was copied from.

use crate::ir::{
    IrClass, IrConstructor, IrExpr, IrField, IrFile, IrFunction, IrProperty, IrValueParameter, NodeId,
};
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

/// A typed attribute name.
pub struct AttributeKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AttributeKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for AttributeKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AttributeKey<T> {}

impl<T> fmt::Debug for AttributeKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeKey({})", self.name)
    }
}

/// Attributes used by the lowering pipeline and the translator.
pub mod keys {
    use super::AttributeKey;
    use crate::ir::{IrExpr, NodeId};
    use std::collections::BTreeSet;

    /// Property is assigned in the primary constructor body (rendered `late`).
    pub const INITIALIZED_IN_CONSTRUCTOR_BODY: AttributeKey<bool> =
        AttributeKey::new("initialized_in_constructor_body");

    /// Property is assigned in the constructor initializer list.
    pub const INITIALIZED_IN_FIELD_INITIALIZER_LIST: AttributeKey<bool> =
        AttributeKey::new("initialized_in_field_initializer_list");

    /// Import URIs a file needs.
    pub const DART_IMPORTS: AttributeKey<BTreeSet<String>> = AttributeKey::new("dart_imports");

    /// Declaration is emitted with the target's `const`.
    pub const DART_CONST: AttributeKey<bool> = AttributeKey::new("dart_const");

    /// Constructor call is emitted with an explicit `const`.
    pub const DART_CONST_CALL: AttributeKey<bool> = AttributeKey::new("dart_const_call");

    /// Leading constructor body statements that apply parameter defaults.
    pub const PARAMETER_PROLOGUE_LEN: AttributeKey<usize> = AttributeKey::new("parameter_prologue_len");

    /// Per-file helper classes generated by lowerings.
    pub const GENERATED_HELPERS: AttributeKey<Vec<GeneratedHelper>> = AttributeKey::new("generated_helpers");

    /// Parts of a const inline function that calls are replaced with.
    pub const CONST_INLINE_BODY: AttributeKey<ConstInlineBody> = AttributeKey::new("const_inline_body");

    /// Static property holding the instance of an object class.
    pub const OBJECT_INSTANCE: AttributeKey<NodeId> = AttributeKey::new("object_instance");

    #[derive(Debug, Clone, PartialEq)]
    pub struct ConstInlineBody {
        /// Parameters in order, with their default values
        pub parameters: Vec<(NodeId, Option<IrExpr>)>,
        /// Local constants in declaration order
        pub locals: Vec<(NodeId, IrExpr)>,
        /// The single returned value
        pub value: IrExpr,
    }

    /// A helper class added to a file once, however many uses it has.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct GeneratedHelper {
        pub name: &'static str,
        pub class: NodeId,
        pub constructor: NodeId,
        pub fq_name: String,
    }
}

/// Nodes that own attribute slots.
pub trait AttributeOwner {
    fn attribute_owner(&self) -> NodeId;
}

macro_rules! impl_owner_with_original {
    ($($ty:ty),*) => {
        $(
            impl AttributeOwner for $ty {
                fn attribute_owner(&self) -> NodeId {
                    self.original.unwrap_or(self.id)
                }
            }
        )*
    };
}

impl_owner_with_original!(IrClass, IrFunction, IrConstructor, IrProperty, IrField, IrValueParameter);

impl AttributeOwner for IrExpr {
    fn attribute_owner(&self) -> NodeId {
        self.id
    }
}

impl AttributeOwner for IrFile {
    fn attribute_owner(&self) -> NodeId {
        self.id
    }
}

impl AttributeOwner for NodeId {
    fn attribute_owner(&self) -> NodeId {
        *self
    }
}

type Slot = (&'static str, TypeId);

/// Identity-keyed side table for one compilation.
#[derive(Default)]
pub struct AttributeStore {
    entries: FxHashMap<NodeId, FxHashMap<Slot, Box<dyn Any>>>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an attribute; `None` if never set.
    pub fn get<T: 'static>(&self, owner: &impl AttributeOwner, key: AttributeKey<T>) -> Option<&T> {
        let owner = owner.attribute_owner();
        self.entries
            .get(&owner)
            .and_then(|slots| slots.get(&(key.name, TypeId::of::<T>())))
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Read a flag attribute, defaulting to `false`.
    pub fn flag(&self, owner: &impl AttributeOwner, key: AttributeKey<bool>) -> bool {
        self.get(owner, key).copied().unwrap_or(false)
    }

    /// Write an attribute, replacing any previous value.
    pub fn set<T: 'static>(&mut self, owner: &impl AttributeOwner, key: AttributeKey<T>, value: T) {
        let owner = owner.attribute_owner();
        self.entries
            .entry(owner)
            .or_default()
            .insert((key.name, TypeId::of::<T>()), Box::new(value));
    }

    /// Read an attribute, creating it with `factory` on first access.
    pub fn get_or_create<T: 'static>(
        &mut self,
        owner: &impl AttributeOwner,
        key: AttributeKey<T>,
        factory: impl FnOnce() -> T,
    ) -> &mut T {
        let owner = owner.attribute_owner();
        let slot = self
            .entries
            .entry(owner)
            .or_default()
            .entry((key.name, TypeId::of::<T>()))
            .or_insert_with(|| Box::new(factory()));
        match slot.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("attribute slot {} holds a value of another type", key.name),
        }
    }

    /// Record that `file` needs `uri` imported.
    pub fn add_import(&mut self, file: NodeId, uri: impl Into<String>) {
        self.get_or_create(&file, keys::DART_IMPORTS, BTreeSet::new)
            .insert(uri.into());
    }

    /// Number of owners with at least one attribute.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeStore")
            .field("owners", &self.entries.len())
            .finish()
    }
}
