//! Typed per-node field storage.
//!
//! A [`Field`] is a named array with one value per node. Element types
//! form a closed set described by [`FieldKind`]; storage is a tagged
//! enum ([`FieldData`]) rather than type-erased boxes, so accessors are
//! plain slice borrows with no downcasting.

use std::fmt;

use num_complex::Complex64;

use crate::error::ConfigurationError;

/// Fixed-dimension geometric vector element. `D` is the spatial
/// dimension of the simulation (2 or 3 in practice).
pub type Vector<const D: usize> = nalgebra::SVector<f64, D>;

// ── FieldKind ──────────────────────────────────────────────────────

/// Element kind tag, describing a field's type without its data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// One `f64` per node.
    Scalar,
    /// One `SVector<f64, D>` per node.
    Vector,
    /// One `i64` per node. Bookkeeping only; not integrable.
    Int,
    /// One `Complex64` per node.
    Complex,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Scalar => "scalar",
            Self::Vector => "vector",
            Self::Int => "int",
            Self::Complex => "complex",
        };
        f.write_str(s)
    }
}

// ── FieldData ──────────────────────────────────────────────────────

/// Tagged storage for one field. Variants correspond one-to-one with
/// [`FieldKind`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldData<const D: usize> {
    /// Scalar storage.
    Scalar(Vec<f64>),
    /// Vector storage.
    Vector(Vec<Vector<D>>),
    /// Integer storage.
    Int(Vec<i64>),
    /// Complex storage.
    Complex(Vec<Complex64>),
}

impl<const D: usize> FieldData<D> {
    /// The kind tag for this storage.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Scalar(_) => FieldKind::Scalar,
            Self::Vector(_) => FieldKind::Vector,
            Self::Int(_) => FieldKind::Int,
            Self::Complex(_) => FieldKind::Complex,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(v) => v.len(),
            Self::Vector(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Complex(v) => v.len(),
        }
    }

    /// True when the storage holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn zeroed(kind: FieldKind, len: usize) -> Self {
        match kind {
            FieldKind::Scalar => Self::Scalar(vec![0.0; len]),
            FieldKind::Vector => Self::Vector(vec![Vector::<D>::zeros(); len]),
            FieldKind::Int => Self::Int(vec![0; len]),
            FieldKind::Complex => Self::Complex(vec![Complex64::new(0.0, 0.0); len]),
        }
    }
}

// ── Field ──────────────────────────────────────────────────────────

/// A named per-node array.
#[derive(Clone, Debug, PartialEq)]
pub struct Field<const D: usize> {
    name: String,
    data: FieldData<D>,
}

impl<const D: usize> Field<D> {
    /// Create a zero-filled field of the given kind and length.
    pub fn zeroed(name: impl Into<String>, kind: FieldKind, len: usize) -> Self {
        Self {
            name: name.into(),
            data: FieldData::zeroed(kind, len),
        }
    }

    /// The field's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's element kind.
    pub fn kind(&self) -> FieldKind {
        self.data.kind()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the field holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the raw storage.
    pub fn data(&self) -> &FieldData<D> {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut FieldData<D> {
        &mut self.data
    }

    /// Scalar view, or `None` if the field is not scalar.
    pub fn scalar(&self) -> Option<&[f64]> {
        match &self.data {
            FieldData::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Mutable scalar view.
    pub fn scalar_mut(&mut self) -> Option<&mut [f64]> {
        match &mut self.data {
            FieldData::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Vector view, or `None` if the field is not vector-valued.
    pub fn vector(&self) -> Option<&[Vector<D>]> {
        match &self.data {
            FieldData::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Mutable vector view.
    pub fn vector_mut(&mut self) -> Option<&mut [Vector<D>]> {
        match &mut self.data {
            FieldData::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Integer view, or `None` if the field is not integer.
    pub fn int(&self) -> Option<&[i64]> {
        match &self.data {
            FieldData::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Mutable integer view.
    pub fn int_mut(&mut self) -> Option<&mut [i64]> {
        match &mut self.data {
            FieldData::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Complex view, or `None` if the field is not complex.
    pub fn complex(&self) -> Option<&[Complex64]> {
        match &self.data {
            FieldData::Complex(v) => Some(v),
            _ => None,
        }
    }

    /// Mutable complex view.
    pub fn complex_mut(&mut self) -> Option<&mut [Complex64]> {
        match &mut self.data {
            FieldData::Complex(v) => Some(v),
            _ => None,
        }
    }

    /// Copy another field's values into this one. Kinds and lengths
    /// must match.
    pub fn copy_from(&mut self, other: &Field<D>) -> Result<(), ConfigurationError> {
        if self.kind() != other.kind() {
            return Err(ConfigurationError::FieldKindConflict {
                name: self.name.clone(),
                existing: self.kind(),
                requested: other.kind(),
            });
        }
        if self.len() != other.len() {
            return Err(ConfigurationError::FieldShapeMismatch {
                name: self.name.clone(),
                expected: self.len(),
                actual: other.len(),
            });
        }
        match (&mut self.data, &other.data) {
            (FieldData::Scalar(a), FieldData::Scalar(b)) => a.copy_from_slice(b),
            (FieldData::Vector(a), FieldData::Vector(b)) => a.copy_from_slice(b),
            (FieldData::Int(a), FieldData::Int(b)) => a.copy_from_slice(b),
            (FieldData::Complex(a), FieldData::Complex(b)) => a.copy_from_slice(b),
            // Kinds checked above.
            _ => {}
        }
        Ok(())
    }
}
