//! Pointwise series transforms

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use shared_types::Transform;

pub type ScalarFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Named scalar functions that `Transform::Custom` can refer to
#[derive(Clone, Default)]
pub struct TransformRegistry {
    functions: HashMap<String, ScalarFn>,
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("TransformRegistry")
            .field("functions", &names)
            .finish()
    }
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Whether `transform` can be applied with what is registered
    pub fn supports(&self, transform: &Transform) -> bool {
        match transform {
            Transform::Custom(name) => self.contains(name),
            _ => true,
        }
    }

    /// Apply `transform` in place. `times` pairs with `values` by position.
    ///
    /// A derivative has no value for the first sample or where time does not
    /// advance; those become NaN so they render as gaps. An unknown custom
    /// function blanks the whole series.
    pub fn apply(&self, transform: &Transform, times: &[f64], values: &mut [f64]) {
        match transform {
            Transform::Negative => values.iter_mut().for_each(|v| *v = -*v),
            Transform::AbsoluteValue => values.iter_mut().for_each(|v| *v = v.abs()),
            Transform::Derivative => derivative(times, values),
            Transform::Custom(name) => match self.functions.get(name) {
                Some(function) => values.iter_mut().for_each(|v| *v = function(*v)),
                None => values.iter_mut().for_each(|v| *v = f64::NAN),
            },
        }
    }
}

fn derivative(times: &[f64], values: &mut [f64]) {
    let n = times.len().min(values.len());
    for i in (1..n).rev() {
        let dt = times[i] - times[i - 1];
        values[i] = if dt > 0.0 {
            (values[i] - values[i - 1]) / dt
        } else {
            f64::NAN
        };
    }
    if let Some(first) = values.first_mut() {
        *first = f64::NAN;
    }
}
