use std::sync::Arc;
use weak_events::{declare_event, EventBus};

declare_event! {
    /// Someone says hello
    struct Greeting(String);
}

declare_event! {
    /// Someone leaves
    struct Farewell(String);
}

struct Console {
    name: &'static str,
}

fn main() -> weak_events::Result<()> {
    println!("Testing weak-events...\n");

    // The application's single bus, passed to whoever needs it
    let bus = Arc::new(EventBus::new()?);

    let token = bus.on::<Greeting>(|text| println!("📨 Anonymous listener got: {text}"));

    let console = Arc::new(Console { name: "console" });
    bus.on_subscriber::<Greeting, _>(&console, |console, text| {
        println!("📨 {} got greeting: {text}", console.name);
    });
    bus.on_subscriber::<Farewell, _>(&console, |console, text| {
        println!("📨 {} got farewell: {text}", console.name);
    });

    println!("Emitting events...");
    bus.emit(Greeting::new("Hello!".into()));
    bus.emit(Farewell::new("See you".into()));

    bus.off_token::<Greeting>(&token);
    bus.reset(&console);
    let delivered = bus.emit(Greeting::new("Anyone there?".into()));
    println!("Delivered after cleanup: {delivered}");

    println!("\n{}", bus.stats());
    println!("\n✅ Demo completed successfully!");
    Ok(())
}
