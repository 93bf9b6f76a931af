use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "yt_audio_server=info,axum=info".into());

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
