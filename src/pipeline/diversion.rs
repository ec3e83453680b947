use crate::charts::sankey::{draw_sankey, normalize_flows, Flow, LeastDesirableLast, TargetOrdering};
use crate::context::RenderContext;
use crate::error::Result;
use crate::format;
use crate::payload::{MaterialRecord, ReportPayload, Section, WasteDiversion};
use crate::primitives::{placeholder, stat_chip};
use crate::table::{draw_table, Cell, Column, Table};

const HEADING: &str = "Waste Diversion";
const SUMMARY_CHIPS: usize = 5;

pub(super) fn render_overview(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    let Some(section) = payload.waste_diversion_data.as_ref() else {
        return Ok(());
    };
    let area = ctx.new_page(HEADING);
    let theme = ctx.theme();
    let diversion = match section {
        Section::Ready(diversion) => diversion,
        Section::Failed { error } => {
            let message = format!("Waste diversion data is unavailable: {}", error);
            placeholder(ctx.surface(), theme, area, &message);
            return Ok(());
        }
    };

    let summary = destination_summary(diversion);
    if !summary.is_empty() {
        let chip_row = ctx.take(50.0);
        let chips = chip_row.columns(SUMMARY_CHIPS.min(summary.len()), theme.gap);
        for (index, (rect, record)) in chips.into_iter().zip(&summary).enumerate() {
            let value = format!(
                "{} ({})",
                format::weight(record.weight_kg),
                format::percent(record.share)
            );
            stat_chip(
                ctx.surface(),
                theme,
                rect,
                &record.name,
                &value,
                theme.palette.categorical(index),
            );
        }
    }

    ctx.subheading("Material flows by destination");
    let area = ctx.remaining_area();
    let flows = diversion.flows();
    draw_sankey(ctx.surface(), theme, area, &flows, &LeastDesirableLast::default());
    Ok(())
}

/// Destination totals, heaviest first: the upstream summary, or one derived from the flows.
pub(crate) fn destination_summary(diversion: &WasteDiversion) -> Vec<MaterialRecord> {
    let mut records = if diversion.destinations.is_empty() {
        let flows = normalize_flows(&diversion.flows());
        let total: f64 = flows.iter().map(|flow| flow.weight).sum();
        let mut records: Vec<MaterialRecord> = Vec::new();
        for flow in &flows {
            match records.iter_mut().find(|record| record.name == flow.target) {
                Some(record) => record.weight_kg += flow.weight,
                None => records.push(MaterialRecord {
                    name: flow.target.clone(),
                    weight_kg: flow.weight,
                    ..Default::default()
                }),
            }
        }
        for record in &mut records {
            record.share = record.weight_kg / total * 100.0;
        }
        records
    } else {
        diversion.destinations.clone()
    };
    records.sort_by(|a, b| {
        b.weight_kg
            .partial_cmp(&a.weight_kg)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    records.truncate(SUMMARY_CHIPS);
    records
}

/// Flows grouped under one header per source, destinations in diagram order.
pub(crate) fn diversion_table(flows: &[Flow], ordering: &dyn TargetOrdering) -> Table {
    let mut table = Table::new(
        "Waste Diversion Detail",
        vec![
            Column::new("Destination", 2.4),
            Column::new("Weight", 1.0).right(),
            Column::new("Share of source", 1.0).right(),
        ],
    );
    let flows = normalize_flows(flows);
    let mut sources: Vec<&str> = Vec::new();
    for flow in &flows {
        if !sources.contains(&flow.source.as_str()) {
            sources.push(&flow.source);
        }
    }

    for source in sources {
        let mut outgoing: Vec<&Flow> = flows.iter().filter(|flow| flow.source == source).collect();
        outgoing.sort_by(|a, b| ordering.compare(&a.target, &b.target));
        let total: f64 = outgoing.iter().map(|flow| flow.weight).sum();
        table.group(format!("{} ({})", source, format::weight(total)));
        for flow in outgoing {
            table.row(vec![
                Cell::text(flow.target.as_str()),
                Cell::text(format::weight(flow.weight)),
                Cell::text(format::percent(flow.weight / total * 100.0)),
            ]);
        }
    }
    table
}

pub(super) fn render_table(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    let Some(diversion) = payload.waste_diversion_data.as_ref().and_then(Section::ready) else {
        return Ok(());
    };
    let table = diversion_table(&diversion.flows(), &LeastDesirableLast::default());
    ctx.new_page(&table.title);
    draw_table(ctx, &table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableRow;

    fn flows() -> Vec<Flow> {
        vec![
            Flow::new("Paper", "Landfill", 10.0),
            Flow::new("Paper", "Recycling", 30.0),
            Flow::new("Glass", "Recycling", 20.0),
            Flow::new("Paper", "Recycling", 10.0),
        ]
    }

    #[test]
    fn table_groups_flows_by_source() {
        let table = diversion_table(&flows(), &LeastDesirableLast::default());
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.rows[0], TableRow::GroupHeader("Paper (50 kg)".into()));
        assert_eq!(
            table.rows[1],
            TableRow::Data(vec![
                Cell::text("Recycling"),
                Cell::text("40 kg"),
                Cell::text("80.0%"),
            ])
        );
        assert_eq!(table.rows[3], TableRow::GroupHeader("Glass (20 kg)".into()));
    }

    #[test]
    fn summary_is_derived_from_flows() {
        let diversion = WasteDiversion {
            flows: Vec::new(),
            destinations: Vec::new(),
        };
        assert!(destination_summary(&diversion).is_empty());

        let diversion: WasteDiversion = serde_json::from_value(serde_json::json!({
            "flows": [["source", "target", "weight"], ["Paper", "Landfill", 25], ["Glass", "Recycling", 75]]
        }))
        .unwrap();
        let summary = destination_summary(&diversion);
        assert_eq!(summary[0].name, "Recycling");
        assert_eq!(summary[0].share, 75.0);
        assert_eq!(summary[1].name, "Landfill");
    }
}
