//! Product classifier: product name text to an enumerated category.
//!
//! Rules are tried in order; the first keyword found (case-insensitive
//! substring) wins. Anything unmatched is `Otros`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    Bebidas,
    Comida,
    Snacks,
    Otros,
}

impl ProductCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bebidas => "Bebidas",
            Self::Comida => "Comida",
            Self::Snacks => "Snacks",
            Self::Otros => "Otros",
        }
    }
}

pub trait ProductClassifier {
    fn classify(&self, product_name: &str) -> ProductCategory;
}

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(ProductCategory, Vec<String>)>,
}

impl KeywordClassifier {
    pub fn new(rules: Vec<(ProductCategory, Vec<String>)>) -> Self {
        let rules = rules
            .into_iter()
            .map(|(cat, words)| (cat, words.into_iter().map(|w| w.to_lowercase()).collect()))
            .collect();
        Self { rules }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        let words = |ws: &[&str]| ws.iter().map(|w| w.to_string()).collect::<Vec<_>>();
        Self::new(vec![
            (
                ProductCategory::Bebidas,
                words(&["agua", "refresco", "zumo", "café", "bebida"]),
            ),
            (
                ProductCategory::Comida,
                words(&["bocadillo", "sandwich", "hamburguesa", "menú"]),
            ),
            (
                ProductCategory::Snacks,
                words(&["chips", "galleta", "chocolate", "snack"]),
            ),
        ])
    }
}

impl ProductClassifier for KeywordClassifier {
    fn classify(&self, product_name: &str) -> ProductCategory {
        let name = product_name.to_lowercase();
        self.rules
            .iter()
            .find(|(_, words)| words.iter().any(|w| name.contains(w.as_str())))
            .map(|(cat, _)| *cat)
            .unwrap_or(ProductCategory::Otros)
    }
}
