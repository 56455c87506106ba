use epigrid::prelude::*;
use strum::IntoEnumIterator;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let context = run_with_args()?;

    println!(
        "{} after {} ticks",
        if context.is_running() {
            "Stopped"
        } else {
            "Epidemic over"
        },
        context.get_current_tick()
    );
    for state in InfectionState::iter() {
        println!("{state}: {}", context.count_agents_in_state(state));
    }
    Ok(())
}
