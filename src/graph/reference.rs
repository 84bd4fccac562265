use serde::{Deserialize, Serialize};

use super::{Location, SymbolId, SymbolKind};

/// Confidence of a usage reference.
///
/// High means the receiver model was statically known at the reference site;
/// low means the reference was matched only by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::High => "high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of usage reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    /// Field bound in a view descriptor
    ViewFieldRead,

    /// Button in a view invoking a method
    ViewButtonCall,

    /// Server action / automation rule writing a field
    ActionFieldWrite,

    /// Cron or automation rule invoking a method
    CronMethodCall,

    /// Field read in a method body (assignment RHS, expression)
    FieldRead,

    /// Field assigned in a method body (assignment LHS)
    FieldWrite,

    /// Method invoked from a method body
    MethodCall,
}

impl UsageKind {
    /// Which symbol namespace this reference targets
    pub fn target_kind(&self) -> SymbolKind {
        match self {
            UsageKind::ViewFieldRead
            | UsageKind::ActionFieldWrite
            | UsageKind::FieldRead
            | UsageKind::FieldWrite => SymbolKind::Field,
            UsageKind::ViewButtonCall | UsageKind::CronMethodCall | UsageKind::MethodCall => {
                SymbolKind::Method
            }
        }
    }

    /// Whether an edge of this kind makes a field live.
    ///
    /// A plain write never does: a field only assigned and never read anywhere
    /// is still dead. Writes performed by configured automation count, since
    /// the automation exists precisely to populate that field.
    pub fn counts_for_field(&self) -> bool {
        matches!(
            self,
            UsageKind::ViewFieldRead | UsageKind::ActionFieldWrite | UsageKind::FieldRead
        )
    }

    /// Whether an edge of this kind makes a method live
    pub fn counts_for_method(&self) -> bool {
        matches!(
            self,
            UsageKind::ViewButtonCall | UsageKind::CronMethodCall | UsageKind::MethodCall
        )
    }
}

/// Receiver model of a reference site.
///
/// Resolution branches on this tag: a known receiver resolves through the
/// inheritance/delegation closure of one model, an unknown receiver fans out
/// by name to every candidate in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Receiver {
    /// Receiver model statically determined at the reference site
    Known(String),
    /// Receiver model could not be determined
    Unknown,
}

/// A raw usage reference emitted by an extractor, before resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUsage {
    /// Textual target name (field or method name)
    pub target: String,

    /// Kind of usage
    pub kind: UsageKind,

    /// Receiver model, when statically determinable
    pub receiver: Receiver,

    /// Where the reference occurs
    pub location: Location,

    /// Confidence assigned at extraction time
    pub confidence: Confidence,
}

impl RawUsage {
    /// Reference whose receiver model is statically known
    pub fn known(
        model: impl Into<String>,
        target: impl Into<String>,
        kind: UsageKind,
        location: Location,
    ) -> Self {
        Self {
            target: target.into(),
            kind,
            receiver: Receiver::Known(model.into()),
            location,
            confidence: Confidence::High,
        }
    }

    /// Reference matched only by name
    pub fn unknown(target: impl Into<String>, kind: UsageKind, location: Location) -> Self {
        Self {
            target: target.into(),
            kind,
            receiver: Receiver::Unknown,
            location,
            confidence: Confidence::Low,
        }
    }
}

/// A resolved usage edge from a reference site to a canonical symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEdge {
    /// The canonical symbol this reference reaches
    pub symbol: SymbolId,

    /// Kind of usage
    pub kind: UsageKind,

    /// Confidence carried forward from the raw reference
    pub confidence: Confidence,

    /// Where the reference occurs
    pub location: Location,
}
