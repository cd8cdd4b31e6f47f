use sensorthings_core::{ParseContext, Request, parse_url};

use crate::error::Result;

/// What `sta-parse` prints for one accepted URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// Canonical target: compressed path plus canonical query string.
    pub canonical: String,
    pub entity_type: String,
    pub collection: bool,
    pub effective_top: u64,
    pub effective_count: bool,
}

impl Inspection {
    fn new(ctx: &ParseContext<'_>, request: Request) -> Self {
        let entity_type = request.path.main_entity_type(ctx.registry).name().to_string();
        let collection = request.path.is_collection();
        let path = request.path.compress();
        let canonical = if request.query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{}", request.query)
        };
        Self {
            canonical,
            entity_type,
            collection,
            effective_top: request.query.effective_top(&ctx.settings.defaults),
            effective_count: request.query.effective_count(&ctx.settings.defaults),
        }
    }

    pub fn render(&self) -> String {
        if self.collection {
            format!(
                "{}\t{}[] top={} count={}",
                self.canonical, self.entity_type, self.effective_top, self.effective_count
            )
        } else {
            format!("{}\t{}", self.canonical, self.entity_type)
        }
    }
}

/// Parses and validates `url`, logging the outcome either way.
pub fn inspect(ctx: &ParseContext<'_>, service_root_url: &str, url: &str) -> Result<Inspection> {
    match parse_url(ctx, service_root_url, url) {
        Ok(request) => {
            let inspection = Inspection::new(ctx, request);
            tracing::info!(
                event = "request.parsed",
                url,
                canonical = %inspection.canonical,
                entity_type = %inspection.entity_type
            );
            Ok(inspection)
        }
        Err(err) => {
            tracing::warn!(event = "request.rejected", url, error = %err);
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use pretty_assertions::assert_eq;
    use sensorthings_core::model::sensing_model;
    use sensorthings_core::{IdKind, ParserSettings, RequestError};

    const ROOT: &str = "http://localhost/sta";

    #[test]
    fn collections_report_paging() {
        let registry = sensing_model(IdKind::Long).unwrap();
        let settings = ParserSettings::default();
        let ctx = ParseContext::new(&registry, &settings);
        let inspection = inspect(
            &ctx,
            ROOT,
            "http://localhost/sta/v1.1/Datastreams(1)/Observations(2)/Datastream/Thing/Locations?$top=5000&$orderby=name",
        )
        .unwrap();
        assert_eq!(
            inspection,
            Inspection {
                canonical: "/Observations(2)/Datastream/Thing/Locations?$orderby=name&$top=5000"
                    .into(),
                entity_type: "Location".into(),
                collection: true,
                effective_top: 1000,
                effective_count: false,
            }
        );
        assert_eq!(
            inspection.render(),
            "/Observations(2)/Datastream/Thing/Locations?$orderby=name&$top=5000\tLocation[] top=1000 count=false"
        );
    }

    #[test]
    fn single_entities_render_without_paging() {
        let registry = sensing_model(IdKind::Long).unwrap();
        let settings = ParserSettings::default();
        let ctx = ParseContext::new(&registry, &settings);
        let inspection = inspect(&ctx, ROOT, "http://localhost/sta/v1.0/Things(7)").unwrap();
        assert_eq!(inspection.render(), "/Things(7)\tThing");
    }

    #[test]
    fn rejected_urls_surface_the_request_error() {
        let registry = sensing_model(IdKind::Long).unwrap();
        let settings = ParserSettings::default();
        let ctx = ParseContext::new(&registry, &settings);
        assert!(matches!(
            inspect(&ctx, ROOT, "http://localhost/sta/v1.1/Things?$filter=result gt 1"),
            Err(CliError::Request(RequestError::Validation(_)))
        ));
    }
}
