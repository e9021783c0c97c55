//! Feature assembly: raw numeric columns plus vectorizer blocks.

use ndarray::Array2;
use polars::prelude::*;
use quill::traits::{FeatureAssembly, FeatureError, Vectorizer};

use crate::vectorizer::{TfidfParams, TfidfVectorizer, build_vectorizer, string_column};

/// One named vectorizer bound to its source text column.
#[derive(Debug, Clone)]
struct VectorizerBinding {
    /// Display name used in reverse lookup, e.g. `vec_text`
    name: String,
    /// Source column the vectorizer reads
    column: String,
    vectorizer: TfidfVectorizer,
}

/// Assembles a feature matrix from raw numeric columns and fitted
/// vectorizers.
///
/// Column layout: the raw columns come first in the order given, then each
/// vectorizer's block in binding order. `find_idx` reverses that layout,
/// returning either the raw column name or `"<name>:<term>"`.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    raw_columns: Vec<String>,
    bindings: Vec<VectorizerBinding>,
}

impl FeatureBuilder {
    /// Create a builder over raw numeric columns, with no vectorizers yet.
    pub fn new<S: Into<String>, I: IntoIterator<Item = S>>(raw_columns: I) -> Self {
        Self {
            raw_columns: raw_columns.into_iter().map(Into::into).collect(),
            bindings: Vec::new(),
        }
    }

    /// Attach a fitted vectorizer reading `column`, addressed as `name`.
    pub fn with_vectorizer(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        vectorizer: TfidfVectorizer,
    ) -> Self {
        self.bindings.push(VectorizerBinding {
            name: name.into(),
            column: column.into(),
            vectorizer,
        });
        self
    }

    /// Raw column names in layout order.
    pub fn raw_columns(&self) -> &[String] {
        &self.raw_columns
    }

    fn raw_block(&self, df: &DataFrame) -> Result<Array2<f64>, FeatureError> {
        let mut block = Array2::zeros((df.height(), self.raw_columns.len()));
        for (j, name) in self.raw_columns.iter().enumerate() {
            let column = df
                .column(name)
                .map_err(|_| FeatureError::MissingColumn(name.clone()))?
                .cast(&DataType::Float64)?;
            for (i, value) in column.f64()?.into_iter().enumerate() {
                block[[i, j]] = value.unwrap_or(0.0);
            }
        }
        Ok(block)
    }
}

impl FeatureAssembly for FeatureBuilder {
    fn fit(&mut self, df: &DataFrame) -> Result<(), FeatureError> {
        for name in &self.raw_columns {
            if df.column(name).is_err() {
                return Err(FeatureError::MissingColumn(name.clone()));
            }
        }
        for binding in &mut self.bindings {
            let docs = string_column(df, &binding.column)?;
            let borrowed: Vec<&str> = docs.iter().map(String::as_str).collect();
            binding.vectorizer.fit(&borrowed)?;
        }
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<Array2<f64>, FeatureError> {
        let total = self.n_features();
        let mut matrix = Array2::zeros((df.height(), total));

        let raw = self.raw_block(df)?;
        matrix
            .slice_mut(ndarray::s![.., ..self.raw_columns.len()])
            .assign(&raw);

        let mut offset = self.raw_columns.len();
        for binding in &self.bindings {
            let docs = string_column(df, &binding.column)?;
            let borrowed: Vec<&str> = docs.iter().map(String::as_str).collect();
            let block = binding.vectorizer.transform(&borrowed)?;
            let width = binding.vectorizer.n_features();
            matrix
                .slice_mut(ndarray::s![.., offset..offset + width])
                .assign(&block);
            offset += width;
        }
        Ok(matrix)
    }

    fn n_features(&self) -> usize {
        self.raw_columns.len()
            + self
                .bindings
                .iter()
                .map(|b| b.vectorizer.n_features())
                .sum::<usize>()
    }

    fn find_idx(&self, idx: usize) -> Option<String> {
        if idx < self.raw_columns.len() {
            return Some(self.raw_columns[idx].clone());
        }
        let mut offset = self.raw_columns.len();
        for binding in &self.bindings {
            let width = binding.vectorizer.n_features();
            if idx < offset + width {
                return binding
                    .vectorizer
                    .feature_name(idx - offset)
                    .map(|term| format!("{}:{}", binding.name, term));
            }
            offset += width;
        }
        None
    }
}

/// Build a feature assembly over `raw_columns` plus one TF-IDF vectorizer
/// per spec entry, each fitted on the matching column of `train`.
pub fn build_feature_assembly(
    train: &DataFrame,
    raw_columns: &[&str],
    spec: &[(String, TfidfParams)],
) -> Result<FeatureBuilder, FeatureError> {
    let mut builder = FeatureBuilder::new(raw_columns.iter().copied());
    for (column, params) in spec {
        let vectorizer = build_vectorizer(train, column, params)?;
        builder = builder.with_vectorizer(format!("vec_{column}"), column.clone(), vectorizer);
    }
    Ok(builder)
}
