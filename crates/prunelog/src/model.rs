//! Read-only view of a network's parameters, buffers and sub-modules.

use ndarray::ArrayD;

/// A trainable tensor with an optional gradient.
#[derive(Clone, Debug)]
pub struct Parameter {
    /// Current values
    pub data: ArrayD<f32>,
    /// Gradient from the last backward pass, if any
    pub grad: Option<ArrayD<f32>>,
}

impl Parameter {
    /// Create a parameter without a gradient.
    pub fn new(data: ArrayD<f32>) -> Self {
        Self { data, grad: None }
    }

    /// Attach a gradient.
    pub fn with_grad(mut self, grad: ArrayD<f32>) -> Self {
        self.grad = Some(grad);
        self
    }
}

/// A node in the model tree.
///
/// Parameters, buffers and children keep their insertion order, which is the
/// order every traversal reports them in.
///
/// # Example
///
/// ```ignore
/// let model = Module::new()
///     .with_child(
///         "conv1",
///         Module::new().with_parameter("weight", Parameter::new(conv_w)),
///     )
///     .with_child(
///         "bn1",
///         Module::new()
///             .with_parameter("weight", Parameter::new(gamma))
///             .with_buffer("running_mean", mean),
///     );
///
/// for (name, tensor) in model.state_dict() {
///     println!("{} {:?}", name, tensor.shape());
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Module {
    parameters: Vec<(String, Parameter)>,
    buffers: Vec<(String, ArrayD<f32>)>,
    children: Vec<(String, Module)>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter on this module.
    pub fn with_parameter(mut self, name: impl Into<String>, param: Parameter) -> Self {
        self.parameters.push((name.into(), param));
        self
    }

    /// Register a non-trainable buffer on this module.
    pub fn with_buffer(mut self, name: impl Into<String>, buffer: ArrayD<f32>) -> Self {
        self.buffers.push((name.into(), buffer));
        self
    }

    /// Attach a sub-module.
    pub fn with_child(mut self, name: impl Into<String>, child: Module) -> Self {
        self.children.push((name.into(), child));
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Look up a parameter or buffer registered directly on this module.
    pub fn local_tensor(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| &p.data)
            .or_else(|| {
                self.buffers
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, b)| b)
            })
    }

    /// All modules in pre-order. The root is reported with an empty name.
    pub fn named_modules(&self) -> Vec<(String, &Module)> {
        let mut out = Vec::new();
        self.collect_modules("", &mut out);
        out
    }

    /// All parameters of the tree, with dotted names.
    pub fn named_parameters(&self) -> Vec<(String, &Parameter)> {
        let mut out = Vec::new();
        for (prefix, module) in self.named_modules() {
            for (name, param) in &module.parameters {
                out.push((join_name(&prefix, name), param));
            }
        }
        out
    }

    /// Every parameter and buffer of the tree, with dotted names.
    ///
    /// Within a module, parameters come before buffers; a module's own
    /// tensors come before its children's.
    pub fn state_dict(&self) -> Vec<(String, &ArrayD<f32>)> {
        let mut out = Vec::new();
        for (prefix, module) in self.named_modules() {
            for (name, param) in &module.parameters {
                out.push((join_name(&prefix, name), &param.data));
            }
            for (name, buffer) in &module.buffers {
                out.push((join_name(&prefix, name), buffer));
            }
        }
        out
    }

    fn collect_modules<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Module)>) {
        out.push((prefix.to_string(), self));
        for (name, child) in &self.children {
            child.collect_modules(&join_name(prefix, name), out);
        }
    }
}

fn join_name(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Strip the `module` segments that data-parallel wrappers insert into names.
pub fn normalize_module_name(name: &str) -> String {
    name.split('.')
        .filter(|segment| *segment != "module")
        .collect::<Vec<_>>()
        .join(".")
}
