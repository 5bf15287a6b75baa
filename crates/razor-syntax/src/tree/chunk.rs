//! Chunk generator tags.
//!
//! The tree carries, for every block and span, a tag saying what a code
//! generator would emit for it. Nothing here generates code; the tags exist
//! so consumers can tell, say, a literal attribute value from a dynamic one.

use std::fmt;

use crate::location::SourceLocation;

/// A string paired with the position it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationTagged {
    pub value: String,
    pub location: SourceLocation,
}

impl LocationTagged {
    pub fn new(value: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            value: value.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChunkGenerator {
    /// Emits nothing
    #[default]
    None,
    Markup,
    Statement,
    Expression,
    Template,
    TypeMember,
    RazorComment,
    Section {
        name: String,
    },
    Attribute {
        name: String,
        prefix: LocationTagged,
        suffix: LocationTagged,
    },
    LiteralAttribute {
        prefix: LocationTagged,
        value: Option<LocationTagged>,
    },
    DynamicAttribute {
        prefix: LocationTagged,
        value_start: SourceLocation,
    },
    SetBaseType {
        base_type: String,
    },
    AddImport {
        namespace: String,
    },
    AddTagHelper {
        lookup: String,
    },
    RemoveTagHelper {
        lookup: String,
    },
    TagHelperPrefix {
        prefix: String,
    },
}

impl fmt::Display for ChunkGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkGenerator::None => write!(f, "None"),
            ChunkGenerator::Markup => write!(f, "Markup"),
            ChunkGenerator::Statement => write!(f, "Stmt"),
            ChunkGenerator::Expression => write!(f, "Expr"),
            ChunkGenerator::Template => write!(f, "Template"),
            ChunkGenerator::TypeMember => write!(f, "TypeMember"),
            ChunkGenerator::RazorComment => write!(f, "RazorComment"),
            ChunkGenerator::Section { name } => write!(f, "Section:{name}"),
            ChunkGenerator::Attribute {
                name,
                prefix,
                suffix,
            } => write!(f, "Attr:{name},{:?},{:?}", prefix.value, suffix.value),
            ChunkGenerator::LiteralAttribute { prefix, value } => write!(
                f,
                "LitAttr:{:?},{:?}",
                prefix.value,
                value.as_ref().map(|v| v.value.as_str()).unwrap_or_default()
            ),
            ChunkGenerator::DynamicAttribute { prefix, .. } => {
                write!(f, "DynAttr:{:?}", prefix.value)
            }
            ChunkGenerator::SetBaseType { base_type } => write!(f, "Base:{base_type}"),
            ChunkGenerator::AddImport { namespace } => write!(f, "Import:{namespace}"),
            ChunkGenerator::AddTagHelper { lookup } => write!(f, "AddTagHelper:{lookup}"),
            ChunkGenerator::RemoveTagHelper { lookup } => {
                write!(f, "RemoveTagHelper:{lookup}")
            }
            ChunkGenerator::TagHelperPrefix { prefix } => write!(f, "TagHelperPrefix:{prefix}"),
        }
    }
}
