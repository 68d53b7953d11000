//! Proposal request model.
//!
//! Maps the fields a proposal request carries onto the placeholder tokens
//! the proposal template uses.

use crate::assemble::BuildRequest;
use crate::error::Result;
use crate::replacements::{token, ReplacementMap, ReplacementValue};
use crate::toggle::ToggleFlags;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Optional pricing values. Only fields that are present produce a
/// replacement; absent ones leave their token in the deck.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PricingOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_fee: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_fee: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_fee: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_fee: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity_fee: Option<Value>,
}

impl PricingOverrides {
    fn fields(&self) -> [(&'static str, Option<&Value>); 5] {
        [
            ("SETUP_FEE", self.setup_fee.as_ref()),
            ("SHORT_FEE", self.short_fee.as_ref()),
            ("FULL_FEE", self.full_fee.as_ref()),
            ("GRANT_FEE", self.grant_fee.as_ref()),
            ("EQUITY_FEE", self.equity_fee.as_ref()),
        ]
    }
}

/// A proposal render request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Client company name, fills `{{COMPANY_NAME}}`
    pub company_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_overrides: Option<PricingOverrides>,

    /// Toggle group flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_toggles: Option<ToggleFlags>,

    /// Explicit 0-based slide positions to remove
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_slides: Option<BTreeSet<usize>>,
}

impl RenderRequest {
    /// Parse a request from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replacement map for this request.
    ///
    /// A `null` pricing field counts as absent; any other non-scalar is an
    /// [`InvalidReplacementValue`](crate::Error::InvalidReplacementValue).
    pub fn replacements(&self) -> Result<ReplacementMap> {
        let mut map = ReplacementMap::new();
        map.insert(token("COMPANY_NAME"), self.company_name.as_str());

        if let Some(pricing) = &self.pricing_overrides {
            for (name, value) in pricing.fields() {
                let Some(value) = value.filter(|v| !v.is_null()) else {
                    continue;
                };
                let key = token(name);
                let value = ReplacementValue::from_json(&key, value)?;
                map.insert(key, value);
            }
        }

        Ok(map)
    }

    /// Convert into the engine's per-build inputs.
    pub fn to_build_request(&self) -> Result<BuildRequest> {
        Ok(BuildRequest::new()
            .with_replacements(self.replacements()?)
            .with_toggles(self.slide_toggles.clone().unwrap_or_default())
            .remove_slides(self.remove_slides.iter().flatten().copied()))
    }

    /// Download file name: `proposal_<company>.pptx`, spaces replaced by
    /// underscores.
    pub fn output_filename(&self, extension: &str) -> String {
        format!("proposal_{}.{}", self.company_name.replace(' ', "_"), extension)
    }
}
