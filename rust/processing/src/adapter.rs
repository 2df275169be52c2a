// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary between the report pipeline and an IFC parser.
//!
//! The pipeline only needs two things from a parser: open a model from a
//! path, and turn it into an element table. Either step may fail for a
//! given file; a failure yields `None` and the file is skipped.

use crate::elements::extract_elements;
use crate::model::IfcModel;
use crate::table::Table;
use std::path::Path;

/// Parser capability consumed by the report session.
pub trait ParserAdapter: Sync {
    /// Parsed model handle.
    type Model: Send;

    /// Open a model. `None` when the file is unreadable or not IFC.
    fn load_model(&self, path: &Path) -> Option<Self::Model>;

    /// Extract the per-element property table. `None` when nothing usable was found.
    fn extract_elements(&self, model: &Self::Model) -> Option<Table>;

    /// Load and extract in one step.
    fn element_table(&self, path: &Path) -> Option<Table> {
        let model = self.load_model(path)?;
        self.extract_elements(&model)
    }
}

/// Adapter backed by the STEP parser in `ifc-report-core`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepParserAdapter;

impl ParserAdapter for StepParserAdapter {
    type Model = IfcModel;

    fn load_model(&self, path: &Path) -> Option<IfcModel> {
        IfcModel::load(path)
    }

    fn extract_elements(&self, model: &IfcModel) -> Option<Table> {
        let table = extract_elements(model);
        if table.is_empty() {
            tracing::warn!(
                schema = %model.schema(),
                entities = model.entity_count(),
                "Model contains no elements"
            );
            return None;
        }
        Some(table)
    }
}
