//! Broadside game entry point.

use broadside::prelude::*;

fn main() {
    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Broadside".to_string(),
                    resolution: (1280, 800).into(),
                    resizable: true,
                    ..default()
                }),
                ..default()
            })
            .set(ImagePlugin::default_nearest()),
    );

    app.add_plugins((
        broadside::game::plugin,
        broadside::third_party::plugin,
        broadside::gameplay::plugin,
    ));

    #[cfg(feature = "dev")]
    app.add_plugins(broadside::dev_tools::plugin);

    app.run();
}
