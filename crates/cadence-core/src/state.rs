//! Integrable state vectors.
//!
//! A [`State`] is a named subset of node-database fields with
//! independently-owned storage. Each physics package enrolls the fields
//! it integrates into its private state; the integrator then treats
//! states as vectors: scaled addition for Runge–Kutta stage
//! accumulation, L2 distance for fixed-point convergence checks.
//!
//! States never alias the node database. The driver refreshes a state
//! from the database at the start of a cycle and writes the accepted
//! result back at finalize.

use indexmap::IndexMap;
use num_complex::Complex64;

use crate::error::ConfigurationError;
use crate::field::{Field, FieldData, FieldKind, Vector};
use crate::nodelist::NodeList;

/// A set of independently-owned field copies supporting vector-space
/// operations.
///
/// Two states derived from the same enrollment sequence share a
/// structure (same names, kinds, and lengths in the same order); the
/// arithmetic operations require that and are paired by slot.
#[derive(Clone, Debug)]
pub struct State<const D: usize> {
    len: usize,
    fields: IndexMap<String, Field<D>>,
}

impl<const D: usize> State<D> {
    /// Create an empty state over `len` nodes.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            fields: IndexMap::new(),
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the state covers zero nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of enrolled fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Enroll a field from the node database, copying its current
    /// values. Idempotent for already-enrolled names. Integer fields
    /// are rejected: they are not integrable.
    pub fn enroll_from(
        &mut self,
        nodes: &NodeList<D>,
        name: &str,
    ) -> Result<(), ConfigurationError> {
        if self.fields.contains_key(name) {
            return Ok(());
        }
        let source = nodes
            .field(name)
            .ok_or_else(|| ConfigurationError::MissingField {
                name: name.to_string(),
            })?;
        if source.kind() == FieldKind::Int {
            return Err(ConfigurationError::NotIntegrable {
                name: name.to_string(),
            });
        }
        self.fields.insert(name.to_string(), source.clone());
        Ok(())
    }

    /// Re-copy every enrolled field's current values from the node
    /// database.
    pub fn refresh_from(&mut self, nodes: &NodeList<D>) -> Result<(), ConfigurationError> {
        for (name, field) in &mut self.fields {
            let source = nodes
                .field(name)
                .ok_or_else(|| ConfigurationError::MissingField { name: name.clone() })?;
            field.copy_from(source)?;
        }
        Ok(())
    }

    /// Copy every enrolled field's values back into the node database.
    pub fn write_back(&self, nodes: &mut NodeList<D>) -> Result<(), ConfigurationError> {
        for (name, field) in &self.fields {
            let target = nodes
                .field_mut(name)
                .ok_or_else(|| ConfigurationError::MissingField { name: name.clone() })?;
            target.copy_from(field)?;
        }
        Ok(())
    }

    /// A zero-filled state with the same structure.
    pub fn ghost(&self) -> State<D> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for (name, field) in &self.fields {
            fields.insert(
                name.clone(),
                Field::zeroed(name.clone(), field.kind(), field.len()),
            );
        }
        State {
            len: self.len,
            fields,
        }
    }

    /// Copy another state's values into this one, slot by slot.
    pub fn assign(&mut self, other: &State<D>) {
        debug_assert_eq!(self.fields.len(), other.fields.len());
        for (dst, src) in self.fields.values_mut().zip(other.fields.values()) {
            match (dst.data_mut(), src.data()) {
                (FieldData::Scalar(a), FieldData::Scalar(b)) => a.copy_from_slice(b),
                (FieldData::Vector(a), FieldData::Vector(b)) => a.copy_from_slice(b),
                (FieldData::Complex(a), FieldData::Complex(b)) => a.copy_from_slice(b),
                _ => debug_assert!(false, "state structures diverged"),
            }
        }
    }

    /// Exchange contents with another state. Implicit-scheme drivers
    /// use this to promote a corrector candidate without reallocating.
    pub fn swap(&mut self, other: &mut State<D>) {
        std::mem::swap(self, other);
    }

    /// Element-wise `self += coeff * other`.
    pub fn scaled_add(&mut self, coeff: f64, other: &State<D>) {
        debug_assert_eq!(self.fields.len(), other.fields.len());
        for (dst, src) in self.fields.values_mut().zip(other.fields.values()) {
            match (dst.data_mut(), src.data()) {
                (FieldData::Scalar(a), FieldData::Scalar(b)) => {
                    for (x, y) in a.iter_mut().zip(b) {
                        *x += coeff * y;
                    }
                }
                (FieldData::Vector(a), FieldData::Vector(b)) => {
                    for (x, y) in a.iter_mut().zip(b) {
                        *x += y * coeff;
                    }
                }
                (FieldData::Complex(a), FieldData::Complex(b)) => {
                    for (x, y) in a.iter_mut().zip(b) {
                        *x += y * coeff;
                    }
                }
                _ => debug_assert!(false, "state structures diverged"),
            }
        }
    }

    /// Element-wise `self *= factor`.
    pub fn scale(&mut self, factor: f64) {
        for field in self.fields.values_mut() {
            match field.data_mut() {
                FieldData::Scalar(v) => {
                    for x in v.iter_mut() {
                        *x *= factor;
                    }
                }
                FieldData::Vector(v) => {
                    for x in v.iter_mut() {
                        *x *= factor;
                    }
                }
                FieldData::Complex(v) => {
                    for x in v.iter_mut() {
                        *x *= factor;
                    }
                }
                // Int fields are rejected at enrollment.
                FieldData::Int(_) => {}
            }
        }
    }

    /// Euclidean norm over every element of every field.
    pub fn l2_norm(&self) -> f64 {
        let mut sum = 0.0;
        for field in self.fields.values() {
            match field.data() {
                FieldData::Scalar(v) => {
                    for x in v {
                        sum += x * x;
                    }
                }
                FieldData::Vector(v) => {
                    for x in v {
                        sum += x.norm_squared();
                    }
                }
                FieldData::Complex(v) => {
                    for x in v {
                        sum += x.norm_sqr();
                    }
                }
                FieldData::Int(_) => {}
            }
        }
        sum.sqrt()
    }

    /// Euclidean distance to another state of the same structure. Used
    /// as the fixed-point convergence metric.
    pub fn l2_distance(&self, other: &State<D>) -> f64 {
        debug_assert_eq!(self.fields.len(), other.fields.len());
        let mut sum = 0.0;
        for (a, b) in self.fields.values().zip(other.fields.values()) {
            match (a.data(), b.data()) {
                (FieldData::Scalar(x), FieldData::Scalar(y)) => {
                    for (p, q) in x.iter().zip(y) {
                        let d = p - q;
                        sum += d * d;
                    }
                }
                (FieldData::Vector(x), FieldData::Vector(y)) => {
                    for (p, q) in x.iter().zip(y) {
                        sum += (p - q).norm_squared();
                    }
                }
                (FieldData::Complex(x), FieldData::Complex(y)) => {
                    for (p, q) in x.iter().zip(y) {
                        sum += (p - q).norm_sqr();
                    }
                }
                _ => debug_assert!(false, "state structures diverged"),
            }
        }
        sum.sqrt()
    }

    /// Borrow an enrolled field by name.
    pub fn field(&self, name: &str) -> Option<&Field<D>> {
        self.fields.get(name)
    }

    /// Enrolled fields in enrollment order.
    pub fn fields(&self) -> impl Iterator<Item = &Field<D>> {
        self.fields.values()
    }

    /// Enrolled field names in enrollment order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Scalar view of an enrolled field.
    pub fn scalar(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).and_then(Field::scalar)
    }

    /// Mutable scalar view of an enrolled field.
    pub fn scalar_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        self.fields.get_mut(name).and_then(Field::scalar_mut)
    }

    /// Vector view of an enrolled field.
    pub fn vector(&self, name: &str) -> Option<&[Vector<D>]> {
        self.fields.get(name).and_then(Field::vector)
    }

    /// Mutable vector view of an enrolled field.
    pub fn vector_mut(&mut self, name: &str) -> Option<&mut [Vector<D>]> {
        self.fields.get_mut(name).and_then(Field::vector_mut)
    }

    /// Complex view of an enrolled field.
    pub fn complex(&self, name: &str) -> Option<&[Complex64]> {
        self.fields.get(name).and_then(Field::complex)
    }

    /// Mutable complex view of an enrolled field.
    pub fn complex_mut(&mut self, name: &str) -> Option<&mut [Complex64]> {
        self.fields.get_mut(name).and_then(Field::complex_mut)
    }
}
