use serde::{Deserialize, Serialize};

use super::container::ElementContainer;
use super::element::SubmodelElement;

/// Signature of a callable element
///
/// Each variable set is an ordered set of typed declarations. A declaration
/// is an ordinary element: its idShort is the variable name, its model type
/// and value type are the declared types, and its value (if any) is the
/// default passed to the handler when the caller supplies none.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub input_variables: ElementContainer,
    #[serde(default)]
    pub output_variables: ElementContainer,
    #[serde(default)]
    pub inoutput_variables: ElementContainer,
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, variable: SubmodelElement) -> Self {
        self.input_variables.insert(variable);
        self
    }

    pub fn with_output(mut self, variable: SubmodelElement) -> Self {
        self.output_variables.insert(variable);
        self
    }

    pub fn with_inoutput(mut self, variable: SubmodelElement) -> Self {
        self.inoutput_variables.insert(variable);
        self
    }
}
