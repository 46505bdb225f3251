#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Dependency-tracked reactive outputs for dashboard sessions.
//!
//! A [`ReactiveGraph`] holds named input cells and the outputs derived from
//! them. Each output registers the inputs it depends on up front (a
//! [`Trigger`]). Setting an input to a value that compares unequal to the
//! previous one marks every subscribed output pending; [`ReactiveGraph::flush`]
//! then recomputes the pending outputs one at a time, in registration
//! order.
//!
//! The graph is driven through `&mut self`, so an output can never be
//! computed concurrently with itself. Inputs changed between flushes only
//! set the pending flag, which queues exactly one recomputation.

use std::collections::BTreeMap;

use serde_json::Value;

/// Errors raised when wiring or driving a [`ReactiveGraph`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReactiveError {
    /// No input with this name was declared.
    #[error("unknown input '{0}'")]
    UnknownInput(String),

    /// An input with this name already exists.
    #[error("input '{0}' is already declared")]
    DuplicateInput(String),

    /// An output with this name already exists.
    #[error("output '{0}' is already registered")]
    DuplicateOutput(String),
}

/// What causes an output to recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Recompute whenever any of the listed inputs changes.
    Reads(Vec<String>),
    /// Recompute only when this one input's value event fires. The output
    /// may read other inputs without subscribing to them.
    Event(String),
}

impl Trigger {
    /// Convenience constructor for [`Trigger::Reads`].
    #[must_use]
    pub fn reads(names: &[&str]) -> Self {
        Self::Reads(names.iter().map(|n| (*n).to_string()).collect())
    }

    /// Convenience constructor for [`Trigger::Event`].
    #[must_use]
    pub fn event(name: &str) -> Self {
        Self::Event(name.to_string())
    }

    fn inputs(&self) -> &[String] {
        match self {
            Self::Reads(names) => names,
            Self::Event(name) => std::slice::from_ref(name),
        }
    }
}

/// Lifecycle of a single output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// Not running.
    Idle,
    /// Inside its compute function.
    Computing,
}

/// Read-only view of the current input values handed to compute functions.
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    values: &'a BTreeMap<String, Value>,
}

impl Inputs<'_> {
    /// Raw value of an input.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String value of an input, if it is a string.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Integer value of an input, if it is an integer.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }
}

type ComputeFn<O> = Box<dyn FnMut(&Inputs<'_>) -> O + Send>;

struct OutputSlot<O> {
    name: String,
    trigger: Trigger,
    compute: ComputeFn<O>,
    state: OutputState,
    pending: bool,
    runs: u64,
}

/// Input cells plus the outputs that depend on them.
pub struct ReactiveGraph<O> {
    inputs: BTreeMap<String, Value>,
    outputs: Vec<OutputSlot<O>>,
    /// input name -> indexes into `outputs`
    subscribers: BTreeMap<String, Vec<usize>>,
}

impl<O> Default for ReactiveGraph<O> {
    fn default() -> Self {
        Self {
            inputs: BTreeMap::new(),
            outputs: Vec::new(),
            subscribers: BTreeMap::new(),
        }
    }
}

impl<O> std::fmt::Debug for ReactiveGraph<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveGraph")
            .field("inputs", &self.inputs)
            .field(
                "outputs",
                &self.outputs.iter().map(|o| &o.name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl<O> ReactiveGraph<O> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an input cell with its initial value.
    ///
    /// # Errors
    ///
    /// Returns [`ReactiveError::DuplicateInput`] if `name` already exists.
    pub fn declare_input(&mut self, name: &str, initial: Value) -> Result<(), ReactiveError> {
        if self.inputs.contains_key(name) {
            return Err(ReactiveError::DuplicateInput(name.to_string()));
        }
        self.inputs.insert(name.to_string(), initial);
        self.subscribers.entry(name.to_string()).or_default();
        Ok(())
    }

    /// Registers an output. It starts pending so the first [`Self::flush`]
    /// produces its initial value.
    ///
    /// # Errors
    ///
    /// Returns [`ReactiveError::DuplicateOutput`] if `name` is taken, or
    /// [`ReactiveError::UnknownInput`] if the trigger names an undeclared
    /// input.
    pub fn register_output<F>(
        &mut self,
        name: &str,
        trigger: Trigger,
        compute: F,
    ) -> Result<(), ReactiveError>
    where
        F: FnMut(&Inputs<'_>) -> O + Send + 'static,
    {
        if self.outputs.iter().any(|o| o.name == name) {
            return Err(ReactiveError::DuplicateOutput(name.to_string()));
        }
        if let Some(missing) = trigger
            .inputs()
            .iter()
            .find(|input| !self.inputs.contains_key(*input))
        {
            return Err(ReactiveError::UnknownInput(missing.clone()));
        }

        let index = self.outputs.len();
        for input in trigger.inputs() {
            let subs = self.subscribers.entry(input.clone()).or_default();
            if !subs.contains(&index) {
                subs.push(index);
            }
        }

        self.outputs.push(OutputSlot {
            name: name.to_string(),
            trigger,
            compute: Box::new(compute),
            state: OutputState::Idle,
            pending: true,
            runs: 0,
        });

        Ok(())
    }

    /// Sets an input value. Subscribed outputs are marked pending only if
    /// the new value differs from the old one.
    ///
    /// Returns whether the value changed.
    ///
    /// # Errors
    ///
    /// Returns [`ReactiveError::UnknownInput`] if `name` was never declared.
    pub fn set_input(&mut self, name: &str, value: Value) -> Result<bool, ReactiveError> {
        let current = self
            .inputs
            .get_mut(name)
            .ok_or_else(|| ReactiveError::UnknownInput(name.to_string()))?;

        if *current == value {
            log::trace!("Input '{name}' unchanged");
            return Ok(false);
        }

        log::debug!("Input '{name}' changed: {current} -> {value}");
        *current = value;

        if let Some(subs) = self.subscribers.get(name) {
            for &index in subs {
                self.outputs[index].pending = true;
            }
        }

        Ok(true)
    }

    /// Current value of an input.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    /// Recomputes every pending output, in registration order, and returns
    /// the fresh values keyed by output name.
    pub fn flush(&mut self) -> Vec<(String, O)> {
        let inputs = Inputs {
            values: &self.inputs,
        };
        let mut results = Vec::new();

        for slot in self.outputs.iter_mut().filter(|o| o.pending) {
            slot.pending = false;
            slot.state = OutputState::Computing;
            log::debug!("Computing output '{}' ({:?})", slot.name, slot.trigger);
            let value = (slot.compute)(&inputs);
            slot.state = OutputState::Idle;
            slot.runs += 1;
            results.push((slot.name.clone(), value));
        }

        results
    }

    /// Names of outputs waiting for the next [`Self::flush`].
    #[must_use]
    pub fn pending(&self) -> Vec<&str> {
        self.outputs
            .iter()
            .filter(|o| o.pending)
            .map(|o| o.name.as_str())
            .collect()
    }

    /// Lifecycle state of an output.
    #[must_use]
    pub fn output_state(&self, name: &str) -> Option<OutputState> {
        self.slot(name).map(|o| o.state)
    }

    /// How many times an output has been computed.
    #[must_use]
    pub fn run_count(&self, name: &str) -> Option<u64> {
        self.slot(name).map(|o| o.runs)
    }

    fn slot(&self, name: &str) -> Option<&OutputSlot<O>> {
        self.outputs.iter().find(|o| o.name == name)
    }
}
