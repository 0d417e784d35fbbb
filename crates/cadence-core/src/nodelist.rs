//! The shared node database.
//!
//! A [`NodeList`] owns every field in the simulation. It is created with
//! a fixed node count; fields are enrolled by name and never removed.
//! The driver owns the database and lends it (`&mut`) to each physics
//! package in turn, so there is exactly one writer at any time.

use indexmap::IndexMap;
use num_complex::Complex64;

use crate::error::ConfigurationError;
use crate::field::{Field, FieldKind, Vector};

/// Canonical name of the per-node mass field.
pub const MASS: &str = "mass";
/// Canonical name of the per-node position field.
pub const POSITION: &str = "position";
/// Canonical name of the per-node velocity field.
pub const VELOCITY: &str = "velocity";
/// Canonical name of the per-node acceleration scratch field.
pub const ACCELERATION: &str = "acceleration";

/// Fixed-size node database: a registry of named fields, one value per
/// node, in enrollment order.
#[derive(Clone, Debug)]
pub struct NodeList<const D: usize> {
    len: usize,
    fields: IndexMap<String, Field<D>>,
}

impl<const D: usize> NodeList<D> {
    /// Create an empty database over `len` nodes.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            fields: IndexMap::new(),
        }
    }

    /// Number of nodes. Every field has exactly this many elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the database covers zero nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of enrolled fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// True if a field with this name is enrolled.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Enroll a zero-filled field. Idempotent: enrolling an existing
    /// name with the same kind is a no-op; a different kind is a
    /// [`ConfigurationError::FieldKindConflict`].
    pub fn enroll(&mut self, name: &str, kind: FieldKind) -> Result<(), ConfigurationError> {
        if let Some(existing) = self.fields.get(name) {
            if existing.kind() != kind {
                return Err(ConfigurationError::FieldKindConflict {
                    name: name.to_string(),
                    existing: existing.kind(),
                    requested: kind,
                });
            }
            return Ok(());
        }
        self.fields
            .insert(name.to_string(), Field::zeroed(name, kind, self.len));
        Ok(())
    }

    /// Borrow a field by name.
    pub fn field(&self, name: &str) -> Option<&Field<D>> {
        self.fields.get(name)
    }

    /// Mutably borrow a field by name.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field<D>> {
        self.fields.get_mut(name)
    }

    /// Enrolled field names in enrollment order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Scalar view of a field, or `None` if absent or not scalar.
    pub fn scalar(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).and_then(Field::scalar)
    }

    /// Mutable scalar view of a field.
    pub fn scalar_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        self.fields.get_mut(name).and_then(Field::scalar_mut)
    }

    /// Vector view of a field, or `None` if absent or not vector-valued.
    pub fn vector(&self, name: &str) -> Option<&[Vector<D>]> {
        self.fields.get(name).and_then(Field::vector)
    }

    /// Mutable vector view of a field.
    pub fn vector_mut(&mut self, name: &str) -> Option<&mut [Vector<D>]> {
        self.fields.get_mut(name).and_then(Field::vector_mut)
    }

    /// Integer view of a field, or `None` if absent or not integer.
    pub fn int(&self, name: &str) -> Option<&[i64]> {
        self.fields.get(name).and_then(Field::int)
    }

    /// Mutable integer view of a field.
    pub fn int_mut(&mut self, name: &str) -> Option<&mut [i64]> {
        self.fields.get_mut(name).and_then(Field::int_mut)
    }

    /// Complex view of a field, or `None` if absent or not complex.
    pub fn complex(&self, name: &str) -> Option<&[Complex64]> {
        self.fields.get(name).and_then(Field::complex)
    }

    /// Mutable complex view of a field.
    pub fn complex_mut(&mut self, name: &str) -> Option<&mut [Complex64]> {
        self.fields.get_mut(name).and_then(Field::complex_mut)
    }

    /// The canonical mass field, if enrolled.
    pub fn mass(&self) -> Option<&[f64]> {
        self.scalar(MASS)
    }

    /// The canonical position field, if enrolled.
    pub fn positions(&self) -> Option<&[Vector<D>]> {
        self.vector(POSITION)
    }

    /// The canonical velocity field, if enrolled.
    pub fn velocities(&self) -> Option<&[Vector<D>]> {
        self.vector(VELOCITY)
    }
}
