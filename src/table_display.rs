use crate::api_client::{
    AnalysisResponse, HealthResponse, SiteDetail, SiteListResponse, StatisticsResponse,
};
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use std::path::Path;

fn header_cells(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

fn fmt_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.1}", s),
        None => "-".to_string(),
    }
}

pub fn display_sites(list: &SiteListResponse, color: bool) {
    if list.sites.is_empty() {
        let message = "No sites found.";
        if color {
            println!("{}", message.yellow());
        } else {
            println!("{message}");
        }
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header_cells(&[
        "ID",
        "Name",
        "Latitude",
        "Longitude",
        "Area (m²)",
        "Total Score",
    ]));

    for site in &list.sites {
        table.add_row(vec![
            site.id.to_string(),
            site.name.clone(),
            format!("{:.5}", site.latitude),
            format!("{:.5}", site.longitude),
            site.area.to_string(),
            fmt_score(site.total_score),
        ]);
    }

    println!("{table}");
    let summary = format!(
        "{} of {} sites (offset {})",
        list.sites.len(),
        list.total,
        list.offset
    );
    if color {
        println!("\n{}", summary.green());
    } else {
        println!("\n{summary}");
    }
}

pub fn display_site_detail(site: &SiteDetail, color: bool) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header_cells(&["Field", "Value"]));

    table.add_row(vec!["ID".to_string(), site.id.to_string()]);
    table.add_row(vec!["Name".to_string(), site.name.clone()]);
    table.add_row(vec![
        "Location".to_string(),
        format!("{:.5}, {:.5}", site.latitude, site.longitude),
    ]);
    table.add_row(vec!["Area (m²)".to_string(), site.area.to_string()]);
    table.add_row(vec![
        "Solar irradiance (kWh/m²/day)".to_string(),
        format!("{:.2}", site.solar_irradiance),
    ]);
    table.add_row(vec![
        "Grid distance (km)".to_string(),
        format!("{:.2}", site.grid_distance),
    ]);
    table.add_row(vec![
        "Slope (degrees)".to_string(),
        format!("{:.1}", site.slope),
    ]);
    table.add_row(vec![
        "Road distance (km)".to_string(),
        format!("{:.2}", site.road_distance),
    ]);

    match &site.scores {
        Some(scores) => {
            table.add_row(vec![
                "Solar score".to_string(),
                format!("{:.1}", scores.solar_score),
            ]);
            table.add_row(vec![
                "Area score".to_string(),
                format!("{:.1}", scores.area_score),
            ]);
            table.add_row(vec![
                "Grid score".to_string(),
                format!("{:.1}", scores.grid_score),
            ]);
            table.add_row(vec![
                "Slope score".to_string(),
                format!("{:.1}", scores.slope_score),
            ]);
            table.add_row(vec![
                "Infrastructure score".to_string(),
                format!("{:.1}", scores.infrastructure_score),
            ]);
            table.add_row(vec![
                "Total score".to_string(),
                format!("{:.1}", scores.total_score),
            ]);
        }
        None => {
            table.add_row(vec![
                "Scores".to_string(),
                "not yet analyzed".to_string(),
            ]);
        }
    }

    println!("{table}");
}

pub fn display_statistics(stats: &StatisticsResponse, _color: bool) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header_cells(&["Metric", "Value"]));

    table.add_row(vec!["Total sites".to_string(), stats.total_sites.to_string()]);
    table.add_row(vec![
        "Average score".to_string(),
        fmt_score(stats.average_score),
    ]);
    table.add_row(vec!["Min score".to_string(), fmt_score(stats.min_score)]);
    table.add_row(vec!["Max score".to_string(), fmt_score(stats.max_score)]);

    println!("{table}");
}

pub fn display_analysis(response: &AnalysisResponse, color: bool) {
    if color {
        if response.success {
            println!("{}", response.message.as_str().green());
        } else {
            println!("{}", response.message.as_str().red());
        }
    } else {
        println!("{}", response.message);
    }

    let weights = &response.weights_used;
    println!(
        "Sites analyzed: {} (at {})",
        response.sites_analyzed,
        response.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "Weights: solar {:.2}, area {:.2}, grid {:.2}, slope {:.2}, infrastructure {:.2}",
        weights.solar, weights.area, weights.grid_distance, weights.slope, weights.infrastructure
    );
}

pub fn display_health(health: &HealthResponse, color: bool) {
    let line = format!("service status: {}", health.status);
    if color && health.status == "ok" {
        println!("{}", line.green());
    } else {
        println!("{line}");
    }
}

pub fn display_export_path(path: &Path, color: bool) {
    let line = format!("✓ Exported to {}", path.display());
    if color {
        println!("{}", line.green());
    } else {
        println!("{line}");
    }
}
