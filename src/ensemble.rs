use derive_more::Display;
use ndarray::Array4;

use crate::{
    error::{LicError, Result},
    field::VectorField,
    types::{Shape, Value},
};

/// Elementwise arithmetic mean of same-shape fields.
///
/// Returns [`LicError::EmptyEnsemble`] for an empty slice and
/// [`LicError::ShapeMismatch`] if any field differs in shape from the first.
pub fn build_average_field(fields: &[VectorField]) -> Result<VectorField> {
    let first = fields.first().ok_or(LicError::EmptyEnsemble)?;
    let shape = first.shape();

    let mut sum: Array4<Value> = Array4::zeros(first.data().raw_dim());
    for field in fields {
        if field.shape() != shape {
            return Err(LicError::ShapeMismatch {
                expected: shape,
                found: field.shape(),
            });
        }
        sum += &field.data();
    }
    sum /= fields.len() as Value;

    VectorField::new(sum)
}

/// A fixed set of same-shape vector fields and their mean field.
#[derive(Clone, Debug, Display)]
#[display("VectorEnsemble(shape={:?}, member_count={})", self.shape(), self.member_count())]
pub struct VectorEnsemble {
    fields: Vec<VectorField>,
    average_field: VectorField,
}

impl VectorEnsemble {
    pub fn new(fields: Vec<VectorField>) -> Result<Self> {
        let average_field = build_average_field(&fields)?;
        Ok(Self {
            fields,
            average_field,
        })
    }

    pub fn shape(&self) -> Shape {
        self.average_field.shape()
    }

    pub fn member_count(&self) -> usize {
        self.fields.len()
    }

    pub fn members(&self) -> &[VectorField] {
        &self.fields
    }

    pub fn average_field(&self) -> &VectorField {
        &self.average_field
    }
}
