use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Heap address as reported by the trace.
pub type Address = u64;

// ────────────────────────────────────────────────────────────────────────────
// Variable
// ────────────────────────────────────────────────────────────────────────────

/// Plain tag for the shape of a [`Variable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VarKind {
    Scalar,
    Pointer,
    Struct,
    StructArray,
    TreeNode,
    MultiDimArray,
}

/// Value of a decoded variable. The variant is the variable's kind, so a
/// kind/value mismatch cannot be represented once a trace is loaded.
///
/// Serialized adjacently tagged: `{"kind": "struct", "value": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum VarValue {
    Scalar(String),
    /// Target address, `None` for NULL.
    Pointer(Option<Address>),
    /// Named fields in declaration order.
    Struct(IndexMap<String, Variable>),
    StructArray(Vec<Variable>),
    /// Linked node: non-pointer fields are drawn stacked, pointer fields fan out below.
    #[serde(rename = "tree-node")]
    Tree(IndexMap<String, Variable>),
    /// Row-major cells. Rows must all have the same length.
    #[serde(rename = "multi-dim-array")]
    Matrix(Vec<Vec<Variable>>),
}

/// A decoded program variable at one trace step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Display name. Filled from the owning map key when empty.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(flatten)]
    pub value: VarValue,
    /// Present iff the variable is heap-resident. May be reused across steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Stable across steps for the same logical object.
    #[serde(default)]
    pub identity: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, value: VarValue) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            value,
            address: None,
            identity: String::new(),
        }
    }

    pub fn scalar(name: impl Into<String>, type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, type_name, VarValue::Scalar(value.into()))
    }

    pub fn pointer(name: impl Into<String>, type_name: impl Into<String>, target: Option<Address>) -> Self {
        Self::new(name, type_name, VarValue::Pointer(target))
    }

    /// Builder-style setter for the heap address.
    pub fn at(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Builder-style setter for the identity.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn kind(&self) -> VarKind {
        match &self.value {
            VarValue::Scalar(_) => VarKind::Scalar,
            VarValue::Pointer(_) => VarKind::Pointer,
            VarValue::Struct(_) => VarKind::Struct,
            VarValue::StructArray(_) => VarKind::StructArray,
            VarValue::Tree(_) => VarKind::TreeNode,
            VarValue::Matrix(_) => VarKind::MultiDimArray,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.value, VarValue::Pointer(_))
    }

    /// Text shown in the value area of a leaf card. Composite values have none.
    pub fn value_string(&self) -> String {
        match &self.value {
            VarValue::Scalar(s) => s.clone(),
            VarValue::Pointer(Some(addr)) => format!("0x{:08x}", addr),
            VarValue::Pointer(None) => "NULL".to_string(),
            _ => String::new(),
        }
    }

    /// Direct children in drawing order. Matrix cells are flattened row-major.
    pub fn children(&self) -> Vec<&Variable> {
        match &self.value {
            VarValue::Scalar(_) | VarValue::Pointer(_) => Vec::new(),
            VarValue::Struct(fields) | VarValue::Tree(fields) => fields.values().collect(),
            VarValue::StructArray(items) => items.iter().collect(),
            VarValue::Matrix(rows) => rows.iter().flatten().collect(),
        }
    }

    /// Structural value comparison used for change detection between steps.
    /// Identity and the variable's own address are ignored.
    pub fn has_same_value(&self, other: &Variable) -> bool {
        if self.type_name != other.type_name || self.name != other.name {
            return false;
        }
        match (&self.value, &other.value) {
            (VarValue::Scalar(a), VarValue::Scalar(b)) => a == b,
            (VarValue::Pointer(a), VarValue::Pointer(b)) => a == b,
            (VarValue::Struct(a), VarValue::Struct(b)) | (VarValue::Tree(a), VarValue::Tree(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.has_same_value(vb))
            }
            (VarValue::StructArray(a), VarValue::StructArray(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.has_same_value(y))
            }
            (VarValue::Matrix(a), VarValue::Matrix(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(ra, rb)| {
                        ra.len() == rb.len() && ra.iter().zip(rb).all(|(x, y)| x.has_same_value(y))
                    })
            }
            _ => false,
        }
    }

    /// Every non-null pointer target reachable inside this value, in field order.
    /// Pointers are not followed.
    pub fn pointer_targets(&self) -> Vec<Address> {
        let mut out = Vec::new();
        self.walk(&mut |v| {
            if let VarValue::Pointer(Some(addr)) = v.value {
                out.push(addr);
            }
        });
        out
    }

    /// Visit this variable and every nested variable, parents first.
    pub fn walk<F>(&self, cb: &mut F)
    where
        F: FnMut(&Variable),
    {
        cb(self);
        for child in self.children() {
            child.walk(cb);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stack frames
// ────────────────────────────────────────────────────────────────────────────

/// One call-stack frame at one trace step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Unique within a step.
    #[serde(default)]
    pub frame_id: u64,
    /// Raw, possibly qualified or mangled signature.
    pub func_name: String,
    #[serde(default)]
    pub is_highlighted: bool,
    #[serde(default)]
    pub is_parent: bool,
    #[serde(default)]
    pub is_zombie: bool,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub parent_frame_id_list: Vec<u64>,
    /// Stable across steps for the same logical frame.
    pub unique_hash: String,
    /// Iteration order of `locals`.
    #[serde(default)]
    pub ordered_varnames: Vec<String>,
    #[serde(default, alias = "encoded_locals")]
    pub locals: IndexMap<String, Variable>,
}

impl StackFrame {
    pub fn new(frame_id: u64, func_name: impl Into<String>, unique_hash: impl Into<String>) -> Self {
        Self {
            frame_id,
            func_name: func_name.into(),
            is_highlighted: false,
            is_parent: false,
            is_zombie: false,
            line: 0,
            parent_frame_id_list: Vec::new(),
            unique_hash: unique_hash.into(),
            ordered_varnames: Vec::new(),
            locals: IndexMap::new(),
        }
    }

    /// Append a local, keeping `ordered_varnames` in sync.
    pub fn with_local(mut self, mut var: Variable) -> Self {
        if var.identity.is_empty() {
            var.identity = format!("{}/{}", self.unique_hash, var.name);
        }
        self.ordered_varnames.push(var.name.clone());
        self.locals.insert(var.name.clone(), var);
        self
    }

    /// Locals in declared order. Names listed without a local are skipped;
    /// loaded traces reject them during validation.
    pub fn local_variables(&self) -> Vec<&Variable> {
        self.ordered_varnames
            .iter()
            .filter_map(|name| self.locals.get(name))
            .collect()
    }
}

/// True when the locals of two snapshots of the same logical frame differ in
/// count or in any value.
pub fn frame_changed(prev: &StackFrame, cur: &StackFrame) -> bool {
    let before = prev.local_variables();
    let after = cur.local_variables();
    before.len() != after.len() || before.iter().zip(&after).any(|(a, b)| !a.has_same_value(b))
}

// ────────────────────────────────────────────────────────────────────────────
// Trace
// ────────────────────────────────────────────────────────────────────────────

/// Frozen snapshot of program memory at one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    #[serde(default)]
    pub globals: Vec<Variable>,
    /// Outermost frame first.
    #[serde(default)]
    pub stack: Vec<StackFrame>,
    #[serde(default)]
    pub heap: Vec<Variable>,
}

impl TraceStep {
    /// The highlighted frame, or the innermost one when none is highlighted.
    pub fn current_frame(&self) -> Option<&StackFrame> {
        self.stack
            .iter()
            .find(|f| f.is_highlighted)
            .or_else(|| self.stack.last())
    }

    pub fn frame_by_hash(&self, unique_hash: &str) -> Option<&StackFrame> {
        self.stack.iter().find(|f| f.unique_hash == unique_hash)
    }
}

/// A recorded execution: one snapshot per step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub steps: Vec<TraceStep>,
}
