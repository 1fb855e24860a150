//! Flight helmet viewer
//!
//! Loads the FlightHelmet glTF model and the studio environment map from
//! `assets/`, then hands control to the viewer: orbit with the mouse, tweak
//! lighting and tone mapping in the Environment panel, Escape to quit.

use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();

    let mut app = patina::default();
    app.set_asset_root("assets");
    app.run();

    Ok(())
}
