//! Click Example - Swapping an event listener across renders
//!
//! This example demonstrates listener reconciliation:
//! - A `button` rendered with an `onClick` handler
//! - A re-render of the same tree with a new handler
//! - A synthetic click that reaches only the new handler
//!
//! Run with: cargo run --example click

use std::cell::Cell;
use std::rc::Rc;

use spark_fiber::{Element, Event, MemoryHost, Props, Renderer, children, create_element};
use tracing_subscriber::EnvFilter;

fn button(label: &str, clicks: Rc<Cell<u32>>) -> Element {
    create_element(
        "div",
        Props::new(),
        children![create_element(
            "button",
            Props::new().on("onClick", move |_: &Event| clicks.set(clicks.get() + 1)),
            children![label],
        )],
    )
}

fn main() -> spark_fiber::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));

    let mut host = MemoryHost::new();
    let container = host.create_container("root");
    let mut renderer = Renderer::new(host);

    println!("=== spark-fiber Click Example ===\n");

    renderer.render(button("first", Rc::clone(&first)), container);
    renderer.flush()?;
    println!("after first render:  {}", renderer.host().render_to_string(container));

    renderer.render(button("second", Rc::clone(&second)), container);
    let report = renderer.flush()?;
    println!("after second render: {}", renderer.host().render_to_string(container));
    println!("commit report:       {report:?}");

    let host = renderer.host();
    let div = host.children(container)[0];
    let node = host.children(div)[0];
    println!("click listeners:     {}", host.listener_count(node, "click"));

    let invoked = host.dispatch(node, &Event::new("click"));
    println!("\nsynthetic click ran {invoked} listener(s)");
    println!("  first handler:  {} click(s)", first.get());
    println!("  second handler: {} click(s)", second.get());

    println!("\n=== Example Complete ===");
    Ok(())
}
