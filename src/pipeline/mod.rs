//! The ordered list of page-producing steps that make up a report.
//!
//! Each [`Step`] pairs a predicate over the payload with a render function. The default order is
//! cover, overview, per-branch performance pages, the performance table, the comparison narrative
//! and charts, the main- and sub-material breakdowns with their tables, and finally the waste
//! diversion diagram and detail table. Steps only read the payload.

mod comparison;
mod cover;
mod diversion;
mod materials;
mod overview;
mod performance;

use log::{debug, warn};

use crate::context::RenderContext;
use crate::error::Result;
use crate::payload::{ReportPayload, Section};
use crate::primitives::message_page;

/// A named page-producing step.
#[derive(Clone, Copy)]
pub struct Step {
    pub name: &'static str,
    pub applies: fn(&ReportPayload) -> bool,
    pub render: fn(&mut RenderContext<'_>, &ReportPayload) -> Result<()>,
}

impl Step {
    pub const fn new(
        name: &'static str,
        applies: fn(&ReportPayload) -> bool,
        render: fn(&mut RenderContext<'_>, &ReportPayload) -> Result<()>,
    ) -> Self {
        Self {
            name,
            applies,
            render,
        }
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

fn always(_: &ReportPayload) -> bool {
    true
}

fn present<T>(section: &Option<Section<T>>) -> bool {
    section.is_some()
}

fn ready<T>(section: &Option<Section<T>>) -> bool {
    section.as_ref().and_then(Section::ready).is_some()
}

/// The standard report, in order.
pub fn standard_steps() -> Vec<Step> {
    vec![
        Step::new("cover", always, cover::render),
        Step::new("overview", |p| present(&p.overview_data), overview::render),
        Step::new(
            "performance_pages",
            |p| present(&p.performance_data),
            performance::render_pages,
        ),
        Step::new(
            "performance_table",
            |p| !p.branches().is_empty(),
            performance::render_table,
        ),
        Step::new(
            "comparison_narrative",
            |p| ready(&p.comparison_data),
            comparison::render_narrative,
        ),
        Step::new(
            "comparison_charts",
            |p| ready(&p.comparison_data),
            comparison::render_charts,
        ),
        Step::new(
            "main_materials_breakdown",
            |p| present(&p.main_materials_data),
            materials::render_main_breakdown,
        ),
        Step::new(
            "main_materials_table",
            |p| ready(&p.main_materials_data),
            materials::render_main_table,
        ),
        Step::new(
            "sub_materials_breakdown",
            |p| present(&p.sub_materials_data),
            materials::render_sub_breakdown,
        ),
        Step::new(
            "sub_materials_table",
            |p| ready(&p.sub_materials_data),
            materials::render_sub_table,
        ),
        Step::new(
            "diversion_overview",
            |p| present(&p.waste_diversion_data),
            diversion::render_overview,
        ),
        Step::new(
            "diversion_table",
            |p| ready(&p.waste_diversion_data),
            diversion::render_table,
        ),
    ]
}

fn warn_failed_sections(payload: &ReportPayload) {
    let sections = [
        ("overview", payload.overview_data.as_ref().and_then(Section::error)),
        ("performance", payload.performance_data.as_ref().and_then(Section::error)),
        ("comparison", payload.comparison_data.as_ref().and_then(Section::error)),
        ("main materials", payload.main_materials_data.as_ref().and_then(Section::error)),
        ("sub materials", payload.sub_materials_data.as_ref().and_then(Section::error)),
        ("waste diversion", payload.waste_diversion_data.as_ref().and_then(Section::error)),
    ];
    for (name, error) in sections {
        if let Some(error) = error {
            warn!("Section '{}' reported an error: {}", name, error);
        }
    }
}

/// Runs `steps` in order against `payload`.
pub fn run(ctx: &mut RenderContext<'_>, payload: &ReportPayload, steps: &[Step]) -> Result<()> {
    warn_failed_sections(payload);
    for step in steps {
        if !(step.applies)(payload) {
            debug!("Skipping step {}", step.name);
            continue;
        }
        let before = ctx.page_count();
        (step.render)(ctx, payload)?;
        debug!(
            "Step {} produced {} page(s)",
            step.name,
            ctx.page_count() - before
        );
    }
    Ok(())
}

/// Data of a section, or `None` after drawing a message page for a failed section.
fn section_or_message<'p, T>(
    ctx: &mut RenderContext<'_>,
    heading: &str,
    section: &'p Option<Section<T>>,
) -> Option<&'p T> {
    match section.as_ref()? {
        Section::Ready(data) => Some(data),
        Section::Failed { error } => {
            message_page(
                ctx,
                heading,
                &format!("{} data is unavailable: {}", heading, error),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_order() {
        let names: Vec<&str> = standard_steps().iter().map(|step| step.name).collect();
        assert_eq!(
            names,
            vec![
                "cover",
                "overview",
                "performance_pages",
                "performance_table",
                "comparison_narrative",
                "comparison_charts",
                "main_materials_breakdown",
                "main_materials_table",
                "sub_materials_breakdown",
                "sub_materials_table",
                "diversion_overview",
                "diversion_table",
            ]
        );
    }

    #[test]
    fn failed_comparison_skips_its_steps() {
        let payload = ReportPayload::from_json(
            r#"{"users": "a", "location": "b", "date_from": "2024-01-01", "date_to": "2024-02-01",
                "comparison_data": {"error": "no data"}}"#,
        )
        .unwrap();
        let applied: Vec<&str> = standard_steps()
            .into_iter()
            .filter(|step| (step.applies)(&payload))
            .map(|step| step.name)
            .collect();
        assert_eq!(applied, vec!["cover"]);
    }
}
