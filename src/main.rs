use anyhow::Result;
use holoscat::output;
use holoscat::settings;

fn main() -> Result<()> {
    env_logger::init();
    let settings = settings::load_config()?;

    let theory = settings.build_theory();
    let hologram = theory.calc_holo(
        &settings.scatterer,
        &settings.detector(),
        &settings.optics(),
        settings.alpha,
    )?;

    output::write_hologram(&settings.output, &hologram)?;
    println!("Hologram written to {:?}", settings.output);
    Ok(())
}
