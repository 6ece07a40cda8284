use indexmap::IndexMap;

use crate::declaration::DeclaredType;
use crate::dynamic::Dynamic;
use crate::error::Error;
use crate::fields::{Field, FieldConfig, ImplicitField};
use crate::order::CreationOrder;
use crate::structures::Structure;
use crate::type_ref::TypeRef;

/// An argument of a field.
///
/// Equality is structural: name, type, default, deprecation and
/// requiredness.
#[derive(Clone, Debug)]
pub struct Argument {
    order: CreationOrder,
    pub of_type: TypeRef,
    pub default_value: Option<serde_json::Value>,
    pub deprecation_reason: Option<String>,
    pub name: Option<String>,
    pub required: bool,
}

impl Argument {
    pub fn new(of_type: impl Into<TypeRef>) -> Self {
        Self {
            order: CreationOrder::next(),
            of_type: of_type.into(),
            default_value: None,
            deprecation_reason: None,
            name: None,
            required: false,
        }
    }

    pub(crate) fn mounted(order: CreationOrder, of_type: TypeRef, config: &FieldConfig) -> Self {
        Self {
            order,
            of_type,
            default_value: config.default_value.clone(),
            deprecation_reason: config.deprecation_reason.clone(),
            name: config.name.clone(),
            required: config.required,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn creation_order(&self) -> CreationOrder {
        self.order
    }

    /// The argument's type, made non-null when it is required.
    pub fn input_type(&self) -> TypeRef {
        if self.required {
            self.of_type.clone().non_null()
        } else {
            self.of_type.clone()
        }
    }
}

impl PartialEq for Argument {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.of_type == other.of_type
            && self.default_value == other.default_value
            && self.deprecation_reason == other.deprecation_reason
            && self.required == other.required
    }
}

/// An entry of a field's argument declarations.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgumentMember {
    Implicit(ImplicitField),
    Argument(Argument),
    /// Always rejected by [`translate_arguments`].
    Field(Field),
}

impl ArgumentMember {
    pub fn creation_order(&self) -> CreationOrder {
        match self {
            ArgumentMember::Implicit(implicit) => implicit.creation_order(),
            ArgumentMember::Argument(argument) => argument.creation_order(),
            ArgumentMember::Field(field) => field.creation_order(),
        }
    }
}

/// Normalizes argument declarations into a map keyed by effective argument
/// name.
///
/// `args` keep their insertion order and come first, followed by `extra_args`
/// in creation order. Implicit members are mounted as arguments. A dynamic
/// member whose type does not resolve is skipped.
pub fn translate_arguments(
    args: &IndexMap<String, ArgumentMember>,
    extra_args: &IndexMap<String, ArgumentMember>,
) -> Result<IndexMap<String, Argument>, Error> {
    let mut extra: Vec<(&String, &ArgumentMember)> = extra_args.iter().collect();
    extra.sort_by_key(|(_, member)| member.creation_order());

    let mut arguments = IndexMap::new();
    for (key, member) in args.iter().chain(extra) {
        let argument = match member {
            ArgumentMember::Implicit(implicit) => match implicit.of_type() {
                TypeRef::Lazy(dynamic) => match dynamic.resolve(None) {
                    None => continue,
                    Some(of_type) => {
                        Argument::mounted(implicit.creation_order(), of_type, implicit.config())
                    }
                },
                _ => implicit.mount_as_argument(),
            },
            ArgumentMember::Argument(argument) => argument.clone(),
            ArgumentMember::Field(field) => {
                return Err(Error::FieldAsArgument {
                    key: key.clone(),
                    type_name: field.field_type.to_string(),
                })
            }
        };
        let name = argument.name.clone().unwrap_or_else(|| key.clone());
        if arguments.contains_key(&name) {
            return Err(Error::DuplicateArgument { name });
        }
        arguments.insert(name, argument);
    }
    Ok(arguments)
}

impl From<ImplicitField> for ArgumentMember {
    fn from(implicit: ImplicitField) -> Self {
        ArgumentMember::Implicit(implicit)
    }
}

impl From<Argument> for ArgumentMember {
    fn from(argument: Argument) -> Self {
        ArgumentMember::Argument(argument)
    }
}

impl From<Field> for ArgumentMember {
    fn from(field: Field) -> Self {
        ArgumentMember::Field(field)
    }
}

impl From<Structure> for ArgumentMember {
    fn from(structure: Structure) -> Self {
        ArgumentMember::Implicit(ImplicitField::new(structure))
    }
}

impl From<TypeRef> for ArgumentMember {
    fn from(type_ref: TypeRef) -> Self {
        ArgumentMember::Implicit(ImplicitField::new(type_ref))
    }
}

impl From<Dynamic> for ArgumentMember {
    fn from(dynamic: Dynamic) -> Self {
        ArgumentMember::Implicit(ImplicitField::new(dynamic))
    }
}

impl From<DeclaredType> for ArgumentMember {
    fn from(declared: DeclaredType) -> Self {
        ArgumentMember::Implicit(ImplicitField::new(declared))
    }
}

impl From<&DeclaredType> for ArgumentMember {
    fn from(declared: &DeclaredType) -> Self {
        ArgumentMember::Implicit(ImplicitField::new(declared))
    }
}
