use serde::{Deserialize, Serialize};

/// Index into the clearance matrix.
pub type ClearanceClass = usize;

/// Required spacing between two clearance classes, per layer. The matrix is
/// symmetric; lookups outside the configured classes or layers yield 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceMatrix {
    class_names: Vec<String>,
    layer_count: usize,
    values: Vec<i64>,
}

impl ClearanceMatrix {
    pub fn new(layer_count: usize, class_names: Vec<String>) -> Self {
        let n = class_names.len();
        ClearanceMatrix {
            class_names,
            layer_count,
            values: vec![0; n * n * layer_count],
        }
    }
    /// A single "default" class with the same clearance on every layer.
    pub fn uniform(layer_count: usize, clearance: i64) -> Self {
        let mut matrix = ClearanceMatrix::new(layer_count, vec!["default".to_string()]);
        matrix.set_value_on_all_layers(0, 0, clearance);
        matrix
    }
    pub fn class_count(&self) -> usize {
        self.class_names.len()
    }
    pub fn class_name(&self, class: ClearanceClass) -> Option<&str> {
        self.class_names.get(class).map(String::as_str)
    }
    pub fn class_by_name(&self, name: &str) -> Option<ClearanceClass> {
        self.class_names.iter().position(|n| n == name)
    }
    fn index(&self, a: ClearanceClass, b: ClearanceClass, layer: usize) -> Option<usize> {
        let n = self.class_names.len();
        if a >= n || b >= n || layer >= self.layer_count {
            return None;
        }
        Some((a * n + b) * self.layer_count + layer)
    }
    pub fn value(&self, a: ClearanceClass, b: ClearanceClass, layer: usize) -> i64 {
        self.index(a, b, layer).map_or(0, |i| self.values[i])
    }
    pub fn set_value(&mut self, a: ClearanceClass, b: ClearanceClass, layer: usize, value: i64) {
        if let (Some(i), Some(j)) = (self.index(a, b, layer), self.index(b, a, layer)) {
            self.values[i] = value;
            self.values[j] = value;
        }
    }
    pub fn set_value_on_all_layers(&mut self, a: ClearanceClass, b: ClearanceClass, value: i64) {
        for layer in 0..self.layer_count {
            self.set_value(a, b, layer, value);
        }
    }
    /// Largest clearance any class requires on the layer.
    pub fn max_value(&self, layer: usize) -> i64 {
        let n = self.class_names.len();
        (0..n)
            .flat_map(|a| (0..n).map(move |b| (a, b)))
            .map(|(a, b)| self.value(a, b, layer))
            .max()
            .unwrap_or(0)
    }
}
