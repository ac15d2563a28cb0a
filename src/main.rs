use anyhow::Context;
use log::{info, LevelFilter};
use portfolio::{
    config::Config,
    document::Document,
    publish::Publisher,
    route::Route,
    signal::{detect_prefers_dark, SystemSignals},
    storage::FileStorage,
    theme::ThemeContext,
    view::{PortfolioView, SECTIONS},
    weather::{ForecastSource, HttpForecastSource},
};
use std::{
    cell::RefCell,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

const INTERVAL: Duration = Duration::from_millis(1000);

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module("portfolio", LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Config::load()?;

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .context("Error setting Ctrl-C handler")?;

    let signals =
        SystemSignals::new(detect_prefers_dark(), config.reduced_motion);
    let document =
        Rc::new(RefCell::new(Document::new(SECTIONS.iter().copied())));
    let theme = ThemeContext::new(
        Box::new(FileStorage::new(&config.storage_path)),
        &signals.prefers_dark,
        Rc::clone(&document),
    );
    let forecast_source = config.weather_enabled.then(|| {
        Box::new(HttpForecastSource::new(&config.forecast_url))
            as Box<dyn ForecastSource>
    });
    let mut view = PortfolioView::mount(
        document,
        theme,
        signals.clone(),
        config.content,
        forecast_source,
    )?;
    let mut publisher = Publisher::new(&config.output_dir);

    info!(
        "Publishing to {} (Ctrl-C to exit)",
        publisher.output_dir().display()
    );
    // Nothing in this loop toggles the theme or jumps between sections.
    // Those are driven by whatever embeds the view; here the tick only
    // settles timers and the OS signal is the only input
    while running.load(Ordering::SeqCst) {
        signals.prefers_dark.set(detect_prefers_dark());
        view.tick(Instant::now());
        for &route in Route::ALL {
            let html = view.render(route)?;
            publisher.publish(&route.output_file(), html)?;
        }
        thread::sleep(INTERVAL);
    }

    info!("Shutting down");
    Ok(())
}
