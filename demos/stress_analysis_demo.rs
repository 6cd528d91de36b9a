use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    shock_response::example_apps::run_stress_analysis(std::env::args().skip(1))
}
