//! Basic Example - First render painted to the terminal
//!
//! This example demonstrates the whole render cycle:
//! - Building an element tree with `create_element`
//! - Scheduling it with `Renderer::render`
//! - Driving the work loop in idle slices until it commits
//! - Painting the committed host tree with `TerminalHost`
//!
//! Run with: cargo run --example basic
//! Log with: RUST_LOG=spark_fiber=debug cargo run --example basic

use std::io;
use std::time::Duration;

use spark_fiber::{
    IdleLoop, Props, Renderer, SchedulerConfig, TerminalHost, children, create_element,
};
use tracing_subscriber::EnvFilter;

fn main() -> spark_fiber::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = SchedulerConfig::from_env();
    let mut host = TerminalHost::new();
    let container = host.create_container("root");
    let mut renderer = Renderer::with_config(host, config);

    let app = create_element(
        "div",
        Props::new().set("id", "app"),
        children![
            create_element("h1", Props::new().set("bold", true), children!["Hello"]),
            create_element("h2", Props::new().set("dim", true), children!["from spark-fiber"]),
        ],
    );
    renderer.render(app, container);

    // Exhausted deadlines: one unit of work per idle callback.
    let mut idle = IdleLoop::new(config);
    let report = idle.run_with(&mut renderer, || Duration::ZERO)?;

    renderer.host_mut().paint(&mut io::stdout(), container)?;

    println!("\n\n=== spark-fiber Basic Example ===");
    println!("  idle slices:     {}", idle.slices());
    println!("  units performed: {}", renderer.units_performed());
    if let Some(report) = report {
        println!("  placements:      {}", report.placements);
        println!("  updates:         {}", report.updates);
        println!("  deletions:       {}", report.deletions);
    }
    Ok(())
}
