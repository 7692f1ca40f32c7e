use wemportal_collector::MetricCatalog;

pub async fn run() -> anyhow::Result<()> {
    let catalog = MetricCatalog::standard();

    println!("{:<28} {:<58} {:<8} {}", "LABEL", "METRIC", "KIND", "STRIP");
    for def in catalog.iter() {
        let strip = def
            .unit_strip
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<28} {:<58} {:<8} {}", def.label, def.metric_name(), def.kind.name(), strip);
    }
    println!();
    println!("{} metrics", catalog.len());
    Ok(())
}
