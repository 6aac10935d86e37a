//! # Clinic API サーバー
//!
//! 患者・医師・予約を管理するクリニック予約 REST API。
//!
//! ## 構成
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │    Client    │────▶│  Clinic API  │────▶│  PostgreSQL  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! 環境変数は [`clinic_api::config`] を参照。
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（.env ファイルを使用）
//! cargo run -p clinic-api
//!
//! # 本番環境
//! CLINIC_PORT=3000 DATABASE_URL=postgres://... cargo run -p clinic-api --release
//! ```

use std::net::SocketAddr;

use anyhow::Context;
use clinic_api::{AppStates, build_app, config::ClinicConfig};
use clinic_infra::db;
use clinic_shared::observability::{TracingConfig, init_tracing};
use tokio::{net::TcpListener, signal};

/// Clinic API サーバーのエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. アプリケーション設定の読み込み
/// 4. 接続プールの作成とマイグレーション
/// 5. HTTP サーバーの起動（シグナル受信で停止し、プールを閉じる）
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("clinic-api"));
    let _tracing_guard = tracing::info_span!("app", service = "clinic-api").entered();

    let config = ClinicConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Clinic API サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool = db::create_pool(&config.database)
        .await
        .context("データベース接続に失敗しました")?;

    if config.run_migrations {
        db::run_migrations(&pool)
            .await
            .context("マイグレーションの適用に失敗しました")?;
    }

    let app = build_app(&config.api_prefix, AppStates::from_pool(pool.clone()));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        api_prefix = %config.api_prefix,
        "Clinic API サーバーが起動しました: {}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db::close_pool(pool).await;
    tracing::info!("Clinic API サーバーを停止しました");

    Ok(())
}

/// Ctrl-C または SIGTERM を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl-C ハンドラの登録に失敗しました");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM ハンドラの登録に失敗しました");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("シャットダウンシグナルを受信しました");
}
