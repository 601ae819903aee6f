//! Format-pair routing: which toolkit script handles which conversion.
//!
//! The toolkit ships exactly three converters, so the table is a small
//! explicit map rather than an N×N matrix. It is built once at startup and
//! handed to the orchestrator by reference — there is no global table, so
//! tests can substitute alternate routes without touching process state.

use crate::format::DocumentFormat;
use crate::output::SupportedFormats;
use std::collections::HashMap;

/// An external converter bound to one (input, output) pair.
///
/// The script is a toolkit entry point launched through the configured
/// interpreter, with the toolkit root as its working directory and a single
/// positional argument: the input path relative to that root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRoute {
    /// Script filename inside the toolkit root, e.g. `docx_to_udf.py`.
    pub script: String,
}

impl ConversionRoute {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

/// Immutable mapping from (input, output) format pairs to converter scripts.
///
/// Each pair maps to at most one route. Pairs absent from the table fail
/// fast in the orchestrator before any subprocess is spawned.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<(DocumentFormat, DocumentFormat), ConversionRoute>,
}

impl RouteTable {
    /// An empty table. Useful in tests; production callers want
    /// [`RouteTable::standard`].
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// The toolkit's shipped converters: docx→udf, udf→docx, udf→pdf.
    pub fn standard() -> Self {
        use DocumentFormat::*;
        let mut table = Self::empty();
        table.insert(Docx, Udf, ConversionRoute::new("docx_to_udf.py"));
        table.insert(Udf, Docx, ConversionRoute::new("udf_to_docx.py"));
        table.insert(Udf, Pdf, ConversionRoute::new("udf_to_pdf.py"));
        table
    }

    /// Bind a route for a pair, replacing any existing binding.
    ///
    /// Only callable while assembling the table; once handed to an
    /// orchestrator the table is behind a shared reference and stays fixed.
    pub fn insert(
        &mut self,
        input: DocumentFormat,
        output: DocumentFormat,
        route: ConversionRoute,
    ) {
        self.routes.insert((input, output), route);
    }

    /// Look up the route for an ordered pair.
    pub fn resolve(
        &self,
        input: DocumentFormat,
        output: DocumentFormat,
    ) -> Option<&ConversionRoute> {
        self.routes.get(&(input, output))
    }

    /// Number of bound routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The formats this table can accept and produce, derived from the
    /// bound routes. Sorted for a stable response shape.
    pub fn supported_formats(&self) -> SupportedFormats {
        let mut input: Vec<DocumentFormat> =
            self.routes.keys().map(|(i, _)| *i).collect();
        let mut output: Vec<DocumentFormat> =
            self.routes.keys().map(|(_, o)| *o).collect();
        input.sort_by_key(|f| f.extension());
        input.dedup();
        output.sort_by_key(|f| f.extension());
        output.dedup();
        SupportedFormats { input, output }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}
