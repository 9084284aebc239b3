use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::host::OpaqueRef;
use crate::source::SourceValue;
use crate::{BuiltinKind, ObjectId};

/// What a type descriptor stands for.
#[derive(Debug)]
pub enum DescriptorKind {
    Builtin(BuiltinKind),
    /// Produced by the class translator; `origin` is the source class it was made from.
    Translated { class_name: String, origin: Option<OpaqueRef> },
    /// A source class that stays behind an opaque reference.
    Opaque(OpaqueRef),
    /// Marker type of parameterized generics.
    Generic,
}

pub struct TypeDescriptor {
    name: String,
    module: Option<String>,
    kind: DescriptorKind,
    supertypes: RefCell<Vec<TargetType>>,
}

/// A target-runtime type. Compared by identity.
#[derive(Clone)]
pub struct TargetType(Rc<TypeDescriptor>);

thread_local! {
    static BUILTINS: Vec<TargetType> = bootstrap();
    static GENERIC: TargetType = TargetType::from_descriptor(TypeDescriptor {
        name: "type".to_string(),
        module: Some("builtins".to_string()),
        kind: DescriptorKind::Generic,
        supertypes: RefCell::new(vec![TargetType::builtin(BuiltinKind::Type)]),
    });
}

fn bootstrap() -> Vec<TargetType> {
    let mut table: Vec<TargetType> = Vec::with_capacity(BuiltinKind::ALL.len());
    for kind in BuiltinKind::ALL {
        let supertypes = match kind.base() {
            Some(base) => vec![table[base.index()].clone()],
            None => Vec::new(),
        };
        table.push(TargetType::from_descriptor(TypeDescriptor {
            name: kind.name().to_string(),
            module: Some(kind.module().to_string()),
            kind: DescriptorKind::Builtin(*kind),
            supertypes: RefCell::new(supertypes),
        }));
    }
    table
}

impl TargetType {
    fn from_descriptor(descriptor: TypeDescriptor) -> Self {
        TargetType(Rc::new(descriptor))
    }

    pub fn builtin(kind: BuiltinKind) -> Self {
        BUILTINS.with(|table| table[kind.index()].clone())
    }

    /// The universal base type (`object`).
    pub fn base() -> Self {
        Self::builtin(BuiltinKind::Object)
    }

    pub fn generic() -> Self {
        GENERIC.with(Clone::clone)
    }

    pub fn translated(
        name: impl Into<String>,
        module: Option<String>,
        class_name: impl Into<String>,
        origin: Option<SourceValue>,
    ) -> Self {
        Self::from_descriptor(TypeDescriptor {
            name: name.into(),
            module,
            kind: DescriptorKind::Translated { class_name: class_name.into(), origin: origin.map(OpaqueRef::new) },
            supertypes: RefCell::new(vec![Self::base()]),
        })
    }

    /// A descriptor standing in for an untranslated source class.
    pub fn opaque(class: &SourceValue) -> Self {
        let name = match class.as_type() {
            Some(ty) => ty.name().to_string(),
            None => class.type_name(),
        };
        Self::from_descriptor(TypeDescriptor {
            name,
            module: class.module_name(),
            kind: DescriptorKind::Opaque(OpaqueRef::new(class.clone())),
            supertypes: RefCell::new(vec![Self::base()]),
        })
    }

    pub fn id(&self) -> ObjectId {
        ObjectId::of(&self.0)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn module(&self) -> Option<&str> {
        self.0.module.as_deref()
    }

    pub fn kind(&self) -> &DescriptorKind {
        &self.0.kind
    }

    pub fn builtin_kind(&self) -> Option<BuiltinKind> {
        match self.kind() {
            DescriptorKind::Builtin(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self.kind(), DescriptorKind::Opaque(_))
    }

    pub fn is_generic(&self) -> bool {
        matches!(self.kind(), DescriptorKind::Generic)
    }

    /// The source class behind a translated or opaque descriptor.
    pub fn origin(&self) -> Option<&SourceValue> {
        match self.kind() {
            DescriptorKind::Translated { origin, .. } => origin.as_ref().map(OpaqueRef::referent),
            DescriptorKind::Opaque(reference) => Some(reference.referent()),
            _ => None,
        }
    }

    pub fn supertypes(&self) -> Vec<TargetType> {
        self.0.supertypes.borrow().clone()
    }

    /// Filled in once the supertypes of a prepared class are known.
    pub fn set_supertypes(&self, supertypes: Vec<TargetType>) {
        *self.0.supertypes.borrow_mut() = supertypes;
    }

    pub fn is_subtype_of(&self, other: &TargetType) -> bool {
        let mut pending = vec![self.clone()];
        while let Some(current) = pending.pop() {
            if &current == other {
                return true;
            }
            pending.extend(current.supertypes());
        }
        false
    }
}

impl PartialEq for TargetType {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TargetType {}

impl Hash for TargetType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            DescriptorKind::Builtin(_) => write!(f, "TargetType({})", self.name()),
            DescriptorKind::Translated { class_name, .. } => write!(f, "TargetType({} as {})", self.name(), class_name),
            DescriptorKind::Opaque(_) => write!(f, "TargetType(opaque {})", self.name()),
            DescriptorKind::Generic => write!(f, "TargetType(generic)"),
        }
    }
}

/// A resolved type hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHint {
    ty: TargetType,
    generic_args: Vec<TypeHint>,
    non_null: Option<TargetType>,
}

impl TypeHint {
    pub fn of(ty: TargetType) -> Self {
        TypeHint { ty, generic_args: Vec::new(), non_null: None }
    }

    /// The universal "any" hint.
    pub fn any() -> Self {
        Self::of(TargetType::base())
    }

    pub fn generic(origin: TargetType, args: Vec<TypeHint>) -> Self {
        TypeHint { ty: origin, generic_args: args, non_null: None }
    }

    /// A union hint: `including_null` covers every member, `excluding_null`
    /// covers every member except `None`.
    pub fn union(including_null: TargetType, excluding_null: TargetType) -> Self {
        TypeHint { ty: including_null, generic_args: Vec::new(), non_null: Some(excluding_null) }
    }

    pub fn ty(&self) -> &TargetType {
        &self.ty
    }

    pub fn generic_args(&self) -> &[TypeHint] {
        &self.generic_args
    }

    pub fn non_null_type(&self) -> &TargetType {
        self.non_null.as_ref().unwrap_or(&self.ty)
    }

    pub fn is_any(&self) -> bool {
        self.ty == TargetType::base() && self.generic_args.is_empty() && self.non_null.is_none()
    }
}
