//! Promotability classification.
//!
//! Ineligibility is a classified negative verdict, never an error: it
//! suppresses diagnostic emission and its reason is retained for
//! observability. Classification is a deterministic, pure function of one
//! snapshot: re-evaluating against an unchanged snapshot always yields
//! the same verdict, which is what makes the per-snapshot memoization in
//! the analysis context sound.

use std::fmt;

use crate::adapter::{Adapter, DelegationShape, LanguageAdapter};
use crate::snapshot::{ProjectSnapshot, SymbolId, TypeId};

use super::HostContractError;
use super::usage::UsageMap;

/// Why a field cannot be promoted. Closed set; every negative verdict
/// carries exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    /// No unique property trivially delegates to the field.
    NoTrivialDelegation,
    /// The field is passed by reference or has its address taken somewhere
    /// in the project; permanently disqualifying.
    UsedByReference,
    /// The field has an initializer and the language version does not
    /// support auto-property initializers.
    InitializerUnsupported,
    /// The property has no setter and the language version does not
    /// support read-only auto-properties.
    ReadOnlyPropertyUnsupported,
    /// The declaration cannot be carried to a property losslessly
    /// (const field, or attributes on the field statement).
    NonTransferableDeclaration,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::NoTrivialDelegation => write!(f, "no-trivial-delegation"),
            IneligibleReason::UsedByReference => write!(f, "used-by-reference"),
            IneligibleReason::InitializerUnsupported => write!(f, "initializer-unsupported"),
            IneligibleReason::ReadOnlyPropertyUnsupported => {
                write!(f, "read-only-property-unsupported")
            }
            IneligibleReason::NonTransferableDeclaration => {
                write!(f, "non-transferable-declaration")
            }
        }
    }
}

/// Verdict for one field/property pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityVerdict {
    Eligible {
        backing_field: SymbolId,
        property: SymbolId,
    },
    Ineligible {
        reason: IneligibleReason,
    },
}

impl EligibilityVerdict {
    pub fn is_eligible(&self) -> bool {
        matches!(self, EligibilityVerdict::Eligible { .. })
    }

    pub fn ineligible_reason(&self) -> Option<IneligibleReason> {
        match self {
            EligibilityVerdict::Ineligible { reason } => Some(*reason),
            EligibilityVerdict::Eligible { .. } => None,
        }
    }
}

/// A property that passed the adapter's shape test, with its delegation.
#[derive(Debug, Clone)]
pub struct PropertyShape {
    pub property: SymbolId,
    pub declaring_type: TypeId,
    pub shape: DelegationShape,
}

/// Run the adapter's shape test over every property in the snapshot.
/// Computed once per pass and shared by all field classifications.
pub fn compute_property_shapes(snapshot: &ProjectSnapshot, adapter: &Adapter) -> Vec<PropertyShape> {
    snapshot
        .properties
        .iter()
        .filter_map(|prop| {
            adapter
                .delegation_shape(prop, &snapshot.symbols)
                .map(|shape| PropertyShape {
                    property: prop.symbol,
                    declaring_type: prop.declaring_type,
                    shape,
                })
        })
        .collect()
}

/// Classify one field.
///
/// Host-contract violations (a field symbol with no declaration, a missing
/// symbol entry) are reported as errors so the caller can degrade to "no
/// diagnostic for this field" without aborting the pass.
pub fn classify_field(
    snapshot: &ProjectSnapshot,
    adapter: &Adapter,
    shapes: &[PropertyShape],
    usages: &UsageMap,
    field: SymbolId,
) -> Result<EligibilityVerdict, HostContractError> {
    let (stmt, declarator_index) = snapshot.field_statement(field).ok_or_else(|| {
        HostContractError::new(format!("field {} has no declaration in the snapshot", field))
    })?;
    snapshot
        .symbols
        .get(field)
        .ok_or_else(|| HostContractError::new(format!("field {} missing from symbol table", field)))?;
    let declarator = &stmt.declarators[declarator_index];

    let ineligible = |reason| Ok(EligibilityVerdict::Ineligible { reason });

    // 1. A unique property in the same type must delegate to this field in
    //    every accessor it declares.
    let mut delegating = shapes.iter().filter(|ps| {
        ps.declaring_type == stmt.declaring_type
            && ps.shape.getter.field == field
            && ps.shape.setter.is_none_or(|s| s.field == field)
    });
    let Some(target) = delegating.next() else {
        return ineligible(IneligibleReason::NoTrivialDelegation);
    };
    if delegating.next().is_some() {
        return ineligible(IneligibleReason::NoTrivialDelegation);
    }

    // 2. By-reference usage anywhere in the project is permanently
    //    disqualifying, independent of accessor shape.
    if usages.kinds(field).has_by_reference_usage() {
        return ineligible(IneligibleReason::UsedByReference);
    }

    // 3. Initializer requires the capability flag.
    if declarator.initializer.is_some()
        && !adapter.supports_property_initializer(snapshot.language_version)
    {
        return ineligible(IneligibleReason::InitializerUnsupported);
    }

    // 4. A setterless property requires read-only auto-properties.
    if target.shape.setter.is_none()
        && !adapter.supports_read_only_properties(snapshot.language_version)
    {
        return ineligible(IneligibleReason::ReadOnlyPropertyUnsupported);
    }

    // 5. Const fields are not instance-replaceable, and attributes cannot
    //    be carried to the property losslessly.
    if stmt.modifiers.is_const || !stmt.attributes.is_empty() {
        return ineligible(IneligibleReason::NonTransferableDeclaration);
    }

    Ok(EligibilityVerdict::Eligible {
        backing_field: field,
        property: target.property,
    })
}
