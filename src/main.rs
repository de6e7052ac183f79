use waitlister::config;
use waitlister::runtime::modes;
use waitlister::system::logging::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 先加载配置，日志初始化依赖 logging 配置段
    config::init_config();
    let config = config::get_config();
    let _guard = init_logging(&config);

    modes::run_server().await
}
