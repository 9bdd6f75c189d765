//! Closed sets of projection policies.
//!
//! Each policy has a canonical upper-case name, used by the external property bag and by the
//! [`show`](crate::procedures::show) view, and a small integer code, used by the persisted mapping.

use crate::error::GraphConfigError;
use std::fmt;
use std::str::FromStr;

/// Common surface of the policy enums, used by the generic (de)serialisation helpers.
pub(crate) trait Policy: FromStr<Err = GraphConfigError> + Default + Copy {
    const PARAM: &'static str;

    fn decode(code: i64) -> Option<Self>;
}

macro_rules! projection_mode {
    (
        $(#[$meta:meta])*
        $name:ident, $param:literal {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = ($code:literal, $canonical:literal)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )+
        }

        impl $name {
            /// Name of the configuration parameter holding this policy.
            pub const PARAM: &'static str = $param;

            /// All values, in code order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The canonical name, e.g. `"SHORTEN"`.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $canonical,)+
                }
            }

            /// The integer code under which the value is persisted.
            pub const fn code(self) -> i64 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Decodes a persisted integer code.
            pub fn from_code(code: i64) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl FromStr for $name {
            type Err = GraphConfigError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($canonical => Ok(Self::$variant),)+
                    _ => Err(GraphConfigError::invalid_param(Self::PARAM, value)),
                }
            }
        }

        impl Policy for $name {
            const PARAM: &'static str = $param;

            fn decode(code: i64) -> Option<Self> {
                Self::from_code(code)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

projection_mode! {
    /// How vocabulary URIs are stored in the property graph.
    VocabUrisMode, "handleVocabUris" {
        /// `<prefix>__<localName>` using the registered namespace prefixes.
        #[default]
        Shorten = (0, "SHORTEN"),
        /// Like [`Shorten`](Self::Shorten) but unknown namespaces are rejected at import time.
        ShortenStrict = (1, "SHORTEN_STRICT"),
        /// Only the local name is kept.
        Ignore = (2, "IGNORE"),
        /// Names are looked up in an explicit vocabulary mapping.
        Map = (3, "MAP"),
        /// Full URIs are kept verbatim.
        Keep = (4, "KEEP"),
    }
}

projection_mode! {
    /// What happens when a property receives more than one value.
    MultivalMode, "handleMultival" {
        #[default]
        Overwrite = (0, "OVERWRITE"),
        Array = (1, "ARRAY"),
    }
}

projection_mode! {
    /// How `rdf:type` statements are projected.
    RdfTypesMode, "handleRDFTypes" {
        /// Types become node labels.
        #[default]
        Labels = (0, "LABELS"),
        /// Types become `rdf:type` edges to class nodes.
        Nodes = (1, "NODES"),
        /// Both labels and edges are written.
        LabelsAndNodes = (2, "LABELS_AND_NODES"),
    }
}

impl VocabUrisMode {
    /// The graph mode derived from this policy.
    pub const fn graph_mode(self) -> GraphMode {
        match self {
            Self::Shorten | Self::ShortenStrict | Self::Keep => GraphMode::Rdf,
            Self::Ignore | Self::Map => GraphMode::Lpg,
        }
    }
}

impl RdfTypesMode {
    /// Whether types are written as node labels.
    pub const fn as_labels(self) -> bool {
        matches!(self, Self::Labels | Self::LabelsAndNodes)
    }

    /// Whether types are written as typed edges to class nodes.
    pub const fn as_nodes(self) -> bool {
        matches!(self, Self::Nodes | Self::LabelsAndNodes)
    }
}

/// Whether nodes are URI-identified RDF resources or plain labelled property graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphMode {
    Rdf,
    Lpg,
}
