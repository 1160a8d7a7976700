//! Registration of wrapped assembly functions as custom primitives of an automatic
//! differentiation host.
//!
//! A host interacts with a primitive only through the [`Primitive`] trait: concrete and abstract
//! evaluation, batching along a leading axis and the reverse- and forward-mode rules. Primitives
//! are owned by an explicit [`PrimitiveRegistry`] and addressed by [`PrimitiveId`].
use crate::array::{Array, ShapedArray};
use crate::convert::template_shape;
use crate::error::{Error, Result};
use crate::eval::assemble_eval;
use crate::jvp::jvp_assemble_eval;
use crate::value::FemValue;
use crate::vjp::{vjp_assemble_eval, Vjp};
use fenris_form::Coefficient;
use log::{debug, trace};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Identifies a primitive within a [`PrimitiveRegistry`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrimitiveId(usize);

impl Display for PrimitiveId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The extension points through which an automatic differentiation host calls a primitive.
pub trait Primitive {
    fn name(&self) -> &str;

    /// Evaluates the primitive on concrete arguments.
    fn evaluate(&self, args: &[Array]) -> Result<Array>;

    /// The shape and element type of the output, given only those of the arguments.
    fn abstract_eval(&self, args: &[ShapedArray]) -> Result<ShapedArray>;

    /// Evaluates the primitive on arguments carrying an extra batch dimension.
    ///
    /// Returns the batched output and the axis of the output along which it is batched.
    fn batch(&self, args: &[Array], batch_axes: &[Option<usize>]) -> Result<(Array, usize)>;

    /// The output together with the map from output cotangents to input cotangents.
    fn vjp(&self, args: &[Array]) -> Result<(Array, Vjp)>;

    /// The output together with its directional derivative along the tangents.
    fn jvp(&self, primals: &[Array], tangents: &[Array]) -> Result<(Array, Array)>;
}

/// A wrapped assembly function and the templates of its arguments.
pub struct AssemblePrimitive<F> {
    templates: Vec<Coefficient>,
    function: F,
}

impl<F> fmt::Debug for AssemblePrimitive<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblePrimitive")
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}

impl<F> AssemblePrimitive<F>
where
    F: Fn(&[Coefficient]) -> eyre::Result<FemValue>,
{
    pub fn new(templates: Vec<Coefficient>, function: F) -> Self {
        Self { templates, function }
    }

    pub fn templates(&self) -> &[Coefficient] {
        &self.templates
    }

    fn check_batch_axes(args: &[Array], batch_axes: &[Option<usize>]) -> Result<usize> {
        if args.len() != batch_axes.len() {
            return Err(Error::TypeCheck(format!(
                "got {} arguments but {} batch axes",
                args.len(),
                batch_axes.len()
            )));
        }
        if let Some(axis) = batch_axes.iter().find(|axis| **axis != Some(0)) {
            return Err(Error::InvalidBatchAxes(format!(
                "all arguments must be batched along axis 0, found {:?}",
                axis
            )));
        }
        let mut sizes = args.iter().map(|arg| arg.shape().first().copied());
        let batch_size = match sizes.next() {
            Some(Some(size)) => size,
            Some(None) => return Err(Error::InvalidBatchAxes("scalar argument can not be batched".to_string())),
            None => return Err(Error::InvalidBatchAxes("no batched arguments".to_string())),
        };
        if let Some(size) = sizes.find(|size| *size != Some(batch_size)) {
            return Err(Error::InvalidBatchAxes(format!(
                "inconsistent batch sizes {} and {:?}",
                batch_size, size
            )));
        }
        Ok(batch_size)
    }
}

impl<F> Primitive for AssemblePrimitive<F>
where
    F: Fn(&[Coefficient]) -> eyre::Result<FemValue>,
{
    fn name(&self) -> &str {
        "assemble_eval"
    }

    fn evaluate(&self, args: &[Array]) -> Result<Array> {
        Ok(assemble_eval(&self.function, &self.templates, args)?.output)
    }

    fn abstract_eval(&self, args: &[ShapedArray]) -> Result<ShapedArray> {
        if args.len() != self.templates.len() {
            return Err(Error::TypeCheck(format!(
                "expected {} arguments, got {}",
                self.templates.len(),
                args.len()
            )));
        }
        for (template, arg) in self.templates.iter().zip(args) {
            let expected = template_shape(template);
            if arg.shape != expected {
                return Err(Error::TypeCheck(format!(
                    "{} template expects an array of shape {:?}, got shape {:?}",
                    template.kind_name(),
                    expected,
                    arg.shape
                )));
            }
        }
        Ok(ShapedArray::scalar())
    }

    fn batch(&self, args: &[Array], batch_axes: &[Option<usize>]) -> Result<(Array, usize)> {
        let batch_size = Self::check_batch_axes(args, batch_axes)?;
        debug!("Evaluating batch of size {}", batch_size);
        let unstacked = args.iter().map(Array::unstack).collect::<Result<Vec<_>>>()?;

        let mut outputs = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            trace!("Evaluating batch element {}", i);
            let element_args: Vec<Array> = unstacked.iter().map(|arg| arg[i].clone()).collect();
            outputs.push(self.evaluate(&element_args)?);
        }
        let output = if outputs.is_empty() {
            Array::zeros(vec![0])
        } else {
            Array::stack(&outputs)?
        };
        Ok((output, 0))
    }

    fn vjp(&self, args: &[Array]) -> Result<(Array, Vjp)> {
        vjp_assemble_eval(&self.function, &self.templates, args)
    }

    fn jvp(&self, primals: &[Array], tangents: &[Array]) -> Result<(Array, Array)> {
        jvp_assemble_eval(&self.function, &self.templates, primals, tangents)
    }
}

/// Owns registered primitives and dispatches host requests to them.
#[derive(Default)]
pub struct PrimitiveRegistry {
    primitives: FxHashMap<PrimitiveId, Box<dyn Primitive>>,
    next_id: usize,
}

impl fmt::Debug for PrimitiveRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.primitives.keys().collect();
        ids.sort();
        f.debug_struct("PrimitiveRegistry")
            .field("primitives", &ids)
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl PrimitiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a primitive and returns its new identifier. Identifiers are never reused.
    pub fn register(&mut self, primitive: Box<dyn Primitive>) -> PrimitiveId {
        let id = PrimitiveId(self.next_id);
        self.next_id += 1;
        debug!("Registering primitive {} as {}", primitive.name(), id);
        self.primitives.insert(id, primitive);
        id
    }

    /// Removes a primitive from the registry, returning it if it was registered.
    pub fn unregister(&mut self, id: PrimitiveId) -> Option<Box<dyn Primitive>> {
        debug!("Unregistering primitive {}", id);
        self.primitives.remove(&id)
    }

    pub fn contains(&self, id: PrimitiveId) -> bool {
        self.primitives.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn get(&self, id: PrimitiveId) -> Result<&dyn Primitive> {
        self.primitives
            .get(&id)
            .map(|primitive| primitive.as_ref())
            .ok_or(Error::UnknownPrimitive(id))
    }

    /// Evaluates the primitive on concrete arguments.
    pub fn bind(&self, id: PrimitiveId, args: &[Array]) -> Result<Array> {
        trace!("Binding primitive {} to {} arguments", id, args.len());
        self.get(id)?.evaluate(args)
    }

    pub fn abstract_eval(&self, id: PrimitiveId, args: &[ShapedArray]) -> Result<ShapedArray> {
        self.get(id)?.abstract_eval(args)
    }

    pub fn batch(&self, id: PrimitiveId, args: &[Array], batch_axes: &[Option<usize>]) -> Result<(Array, usize)> {
        self.get(id)?.batch(args, batch_axes)
    }

    pub fn vjp(&self, id: PrimitiveId, args: &[Array]) -> Result<(Array, Vjp)> {
        self.get(id)?.vjp(args)
    }

    pub fn jvp(&self, id: PrimitiveId, primals: &[Array], tangents: &[Array]) -> Result<(Array, Array)> {
        self.get(id)?.jvp(primals, tangents)
    }
}

/// Wraps an assembly function as a primitive with the given argument templates and registers it.
///
/// The function receives one coefficient per template, created from the arguments of each call,
/// and must return the assembled scalar together with the form it was assembled from:
///
/// ```
/// # use fenris_autodiff::{register_assemble, Array, FemValue, PrimitiveRegistry};
/// # use fenris_form::{assemble, dx, Coefficient, Constant, Expr, Mesh};
/// # use std::sync::Arc;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mesh = Arc::new(Mesh::unit_square(2));
/// let mut registry = PrimitiveRegistry::new();
/// let templates = vec![Coefficient::from(Constant::scalar(0.0))];
/// let id = register_assemble(&mut registry, templates, move |inputs: &[Coefficient]| {
///     let c = Expr::from(&inputs[0]);
///     let form = c.clone() * c * dx(&mesh);
///     Ok(FemValue::from((assemble(&form)?, form)))
/// });
///
/// let output = registry.bind(id, &[Array::scalar(3.0)])?;
/// assert!((output.to_scalar().unwrap() - 9.0).abs() < 1e-12);
/// # Ok(())
/// # }
/// ```
pub fn register_assemble<F>(registry: &mut PrimitiveRegistry, templates: Vec<Coefficient>, function: F) -> PrimitiveId
where
    F: Fn(&[Coefficient]) -> eyre::Result<FemValue> + 'static,
{
    registry.register(Box::new(AssemblePrimitive::new(templates, function)))
}
