//! IssuanceService 集成测试
//!
//! 覆盖批量生成、key 形态、contents 校验与 wrap_contents 的宽松语义。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo test --test issuance_test -- --ignored
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use regex::Regex;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;

use promo_service::error::PromoError;
use promo_service::repository::{ContentRepository, PromoRepository};
use promo_service::service::{ContentService, IssuanceService, RedemptionService};

// ==================== 辅助函数 ====================

struct TestContext {
    redemption: Arc<RedemptionService>,
    issuance: Arc<IssuanceService>,
    contents: Arc<ContentService>,
}

async fn setup() -> TestContext {
    let url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("连接测试数据库失败");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("执行迁移失败");

    let promo_repo = Arc::new(PromoRepository::new(pool.clone()));
    let content_repo = Arc::new(ContentRepository::new(pool.clone()));

    let redemption = Arc::new(RedemptionService::new(
        promo_repo.clone(),
        content_repo.clone(),
        pool,
    ));
    let issuance = Arc::new(IssuanceService::new(redemption.clone(), promo_repo));
    let contents = Arc::new(ContentService::new(content_repo));

    TestContext {
        redemption,
        issuance,
        contents,
    }
}

fn fresh_gamespace() -> i64 {
    rand::rng().random_range(1_000_000..2_000_000_000)
}

// ==================== 批量生成 ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn generate_codes_returns_distinct_wellformed_keys() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    ctx.contents
        .create(gamespace, "gold", &json!({"grant": 10}))
        .await
        .unwrap();

    let keys = ctx
        .issuance
        .generate_codes(
            gamespace,
            5,
            Utc::now() + Duration::days(30),
            &json!({"gold": 10}),
            3,
        )
        .await
        .expect("批量生成应成功");

    assert_eq!(keys.len(), 3);

    let pattern = Regex::new("^[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}$").unwrap();
    for key in &keys {
        assert!(pattern.is_match(key), "key {} 形态不合法", key);
    }

    let distinct: HashSet<_> = keys.iter().collect();
    assert_eq!(distinct.len(), 3, "key 必须互不相同");

    // 每个 key 都真实入库且带着同一份配置
    for key in &keys {
        let promo = ctx.redemption.find_code(gamespace, key).await.unwrap();
        assert_eq!(promo.code_amount, 5);
    }
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn generated_code_is_redeemable_amount_times_across_accounts() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    ctx.contents
        .create(gamespace, "gold", &json!({"grant": 10}))
        .await
        .unwrap();

    let keys = ctx
        .issuance
        .generate_codes(
            gamespace,
            5,
            Utc::now() + Duration::days(30),
            &json!({"gold": 10}),
            1,
        )
        .await
        .unwrap();
    let key = &keys[0];

    // 5 个不同账号依次兑换成功
    for account_id in 1..=5 {
        ctx.redemption
            .redeem(gamespace, account_id, key)
            .await
            .unwrap_or_else(|e| panic!("账号 {} 兑换应成功: {}", account_id, e));
    }

    // 次数耗尽后第 6 个账号只能看到不可用
    let exhausted = ctx.redemption.redeem(gamespace, 6, key).await;
    assert!(matches!(exhausted, Err(PromoError::CodeNotFound)));
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn generate_codes_validates_inputs() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    let expires = Utc::now() + Duration::days(1);

    // contents 不是对象
    let bad_contents = ctx
        .issuance
        .generate_codes(gamespace, 5, expires, &json!(["gold"]), 1)
        .await;
    assert!(matches!(bad_contents, Err(PromoError::InvalidContents)));

    let bad_amounts = ctx
        .issuance
        .generate_codes(gamespace, 5, expires, &json!({"gold": "ten"}), 1)
        .await;
    assert!(matches!(bad_amounts, Err(PromoError::InvalidContents)));

    // 生成数量必须 >= 1
    let zero_count = ctx
        .issuance
        .generate_codes(gamespace, 5, expires, &json!({"gold": 1}), 0)
        .await;
    assert!(matches!(zero_count, Err(PromoError::Validation(_))));
}

// ==================== 显式创建 ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn explicit_create_with_duplicate_key_conflicts() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    ctx.contents
        .create(gamespace, "gold", &json!({"grant": 1}))
        .await
        .unwrap();

    let expires = Utc::now() + Duration::days(1);
    ctx.redemption
        .create_code(gamespace, "DUPE-0000-0001", 1, expires, &json!({"gold": 1}))
        .await
        .expect("首次创建应成功");

    let second = ctx
        .redemption
        .create_code(gamespace, "DUPE-0000-0001", 1, expires, &json!({"gold": 1}))
        .await;
    assert!(matches!(second, Err(PromoError::CodeExists(_))));
}

// ==================== wrap_contents ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn wrap_contents_maps_names_and_drops_unknown() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    let gold_id = ctx
        .contents
        .create(gamespace, "gold", &json!({"grant": 1}))
        .await
        .unwrap();
    let gems_id = ctx
        .contents
        .create(gamespace, "gems", &json!({"grant": 2}))
        .await
        .unwrap();

    let requested = [
        ("gold".to_string(), 10_i64),
        ("gems".to_string(), 3),
        ("no-such-content".to_string(), 99),
    ]
    .into_iter()
    .collect();

    let wrapped = ctx
        .redemption
        .wrap_contents(gamespace, &requested)
        .await
        .unwrap();

    // 未知名称被静默丢弃，其余映射到内容 ID 空间
    assert_eq!(wrapped.len(), 2);
    assert_eq!(wrapped[&gold_id.to_string()], 10);
    assert_eq!(wrapped[&gems_id.to_string()], 3);
}
