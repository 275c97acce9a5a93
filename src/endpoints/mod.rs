//! Endpoint-extractor plug-in contract (SPEC_FULL.md §6): `extract_endpoints`
//! populates `route_data`/`view_data`, `dump` persists both as JSON. Ships
//! one reference implementation, [`struts2::Struts2Extractor`], for the
//! Struts2 XML action-mapping family; a SpringMVC annotation-based extractor
//! is an external collaborator's job (its routes already surface as
//! `@RequestMapping`-family sources via `crate::stages::source_sink`).

pub mod struts2;

use crate::errors::CpgResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One discovered action mapping: `route` is the URL pattern, `params` the
/// request-parameter names the view is known to submit for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteEntry {
    pub class: String,
    pub method: String,
    pub route: String,
    pub params: Vec<String>,
}

/// One discovered HTML/JSP form: which route it posts to and which field
/// names it submits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub route: String,
    pub fields: Vec<String>,
}

pub trait EndpointExtractor {
    fn extract_endpoints(&mut self) -> CpgResult<()>;
    fn route_data(&self) -> &[RouteEntry];
    fn view_data(&self) -> &[ViewDescriptor];

    /// Persist both collections as `routeData.json`/`viewData.json` under
    /// `dir` (SPEC_FULL.md §6).
    fn dump(&self, dir: &Path) -> CpgResult<()> {
        let routes = serde_json::to_string_pretty(self.route_data())?;
        std::fs::write(dir.join("routeData.json"), routes)?;
        let views = serde_json::to_string_pretty(self.view_data())?;
        std::fs::write(dir.join("viewData.json"), views)?;
        Ok(())
    }
}
