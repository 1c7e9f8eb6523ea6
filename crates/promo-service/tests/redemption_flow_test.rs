//! RedemptionService 集成测试
//!
//! 使用真实 PostgreSQL 测试兑换的完整事务流程。
//! 兑换是行锁 + 多语句事务，纯 mock 覆盖不了并发语义，
//! 因此这里全部走真库。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo test --test redemption_flow_test -- --ignored
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::join_all;
use rand::Rng;
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use promo_service::error::PromoError;
use promo_service::repository::{ContentRepository, PromoRepository};
use promo_service::service::{ContentService, IssuanceService, RedemptionService};

// ==================== 辅助函数 ====================

struct TestContext {
    pool: PgPool,
    redemption: Arc<RedemptionService>,
    issuance: Arc<IssuanceService>,
    contents: Arc<ContentService>,
}

async fn setup() -> TestContext {
    let url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    let pool = PgPoolOptions::new()
        .max_connections(16)
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
        pool.clone(),
    ));
    let issuance = Arc::new(IssuanceService::new(redemption.clone(), promo_repo));
    let contents = Arc::new(ContentService::new(content_repo));

    TestContext {
        pool,
        redemption,
        issuance,
        contents,
    }
}

/// 每个测试用独立的 gamespace，互不干扰，也允许对同一库重复跑
fn fresh_gamespace() -> i64 {
    rand::rng().random_range(1_000_000..2_000_000_000)
}

/// 插入一条奖励内容，返回 content_id
async fn seed_content(ctx: &TestContext, gamespace_id: i64, name: &str, payload: Value) -> i64 {
    ctx.contents
        .create(gamespace_id, name, &payload)
        .await
        .expect("插入测试内容失败")
}

/// 生成一个促销码并返回 key
async fn issue_code(
    ctx: &TestContext,
    gamespace_id: i64,
    code_amount: i32,
    contents: Value,
) -> String {
    let keys = ctx
        .issuance
        .generate_codes(
            gamespace_id,
            code_amount,
            Utc::now() + Duration::days(7),
            &contents,
            1,
        )
        .await
        .expect("生成测试促销码失败");
    keys.into_iter().next().expect("应生成一个 key")
}

/// 统计某促销码的使用记录条数
async fn count_usages(pool: &PgPool, gamespace_id: i64, code_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM promo_code_usages WHERE gamespace_id = $1 AND code_id = $2",
    )
    .bind(gamespace_id)
    .bind(code_id)
    .fetch_one(pool)
    .await
    .expect("统计使用记录失败")
}

// ==================== 基本流程 ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn redeem_grants_rewards_and_decrements_amount() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    seed_content(&ctx, gamespace, "gold", json!({"currency": "gold", "grant": 100})).await;
    let key = issue_code(&ctx, gamespace, 3, json!({"gold": 10})).await;

    let rewards = ctx
        .redemption
        .redeem(gamespace, 42, &key)
        .await
        .expect("首次兑换应成功");

    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].amount, 10);
    assert_eq!(rewards[0].payload, json!({"currency": "gold", "grant": 100}));

    // 剩余次数恰好减一，使用记录恰好一条
    let promo = ctx.redemption.find_code(gamespace, &key).await.unwrap();
    assert_eq!(promo.code_amount, 2);
    assert_eq!(count_usages(&ctx.pool, gamespace, promo.code_id).await, 1);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn second_attempt_by_same_account_is_rejected() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    seed_content(&ctx, gamespace, "gems", json!({"gems": 5})).await;
    let key = issue_code(&ctx, gamespace, 5, json!({"gems": 1})).await;

    ctx.redemption
        .redeem(gamespace, 7, &key)
        .await
        .expect("首次兑换应成功");

    // 剩余次数还很多，但同一账号的第二次必须被拒
    let second = ctx.redemption.redeem(gamespace, 7, &key).await;
    assert!(matches!(second, Err(PromoError::AlreadyUsed)));

    // 次数只被扣了一次
    let promo = ctx.redemption.find_code(gamespace, &key).await.unwrap();
    assert_eq!(promo.code_amount, 4);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn malformed_key_is_rejected_before_storage() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    let result = ctx.redemption.redeem(gamespace, 1, "not-a-promo-code").await;
    assert!(matches!(result, Err(PromoError::InvalidKey)));
}

// ==================== 资格过滤 ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn expired_code_is_not_found() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    seed_content(&ctx, gamespace, "gold", json!({"grant": 1})).await;
    ctx.redemption
        .create_code(
            gamespace,
            "EXPD-0000-0001",
            5,
            Utc::now() - Duration::hours(1),
            &json!({"gold": 1}),
        )
        .await
        .expect("创建过期促销码失败");

    // 过期必须是 CodeNotFound，不能泄露成 AlreadyUsed 或成功
    let result = ctx.redemption.redeem(gamespace, 9, "EXPD-0000-0001").await;
    assert!(matches!(result, Err(PromoError::CodeNotFound)));
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn empty_contents_fails_without_consuming_a_use() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    ctx.redemption
        .create_code(
            gamespace,
            "EMPT-0000-0001",
            3,
            Utc::now() + Duration::days(1),
            &json!({}),
        )
        .await
        .expect("创建空内容促销码失败");

    let result = ctx.redemption.redeem(gamespace, 11, "EMPT-0000-0001").await;
    assert!(matches!(result, Err(PromoError::NoContents(_))));

    // 整个事务回滚：没有使用记录，次数原封不动
    let promo = ctx
        .redemption
        .find_code(gamespace, "EMPT-0000-0001")
        .await
        .unwrap();
    assert_eq!(promo.code_amount, 3);
    assert_eq!(count_usages(&ctx.pool, gamespace, promo.code_id).await, 0);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn dangling_content_reference_is_a_persistence_fault() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    let content_id = seed_content(&ctx, gamespace, "gone", json!({"grant": 1})).await;
    let key = issue_code(&ctx, gamespace, 2, json!({"gone": 1})).await;

    // 删除仍被促销码引用的内容，制造悬空引用
    ctx.contents.delete(gamespace, content_id).await.unwrap();

    let result = ctx.redemption.redeem(gamespace, 13, &key).await;
    assert!(matches!(result, Err(PromoError::ContentMissing(id)) if id == content_id));

    // 解析失败同样回滚，不消耗使用次数
    let promo = ctx.redemption.find_code(gamespace, &key).await.unwrap();
    assert_eq!(promo.code_amount, 2);
    assert_eq!(count_usages(&ctx.pool, gamespace, promo.code_id).await, 0);
}

// ==================== 并发语义 ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn concurrent_redemptions_of_single_use_code() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    seed_content(&ctx, gamespace, "gold", json!({"grant": 1})).await;
    let key = issue_code(&ctx, gamespace, 1, json!({"gold": 1})).await;

    // 8 个不同账号同时抢一个只剩 1 次的码
    let tasks: Vec<_> = (0..8)
        .map(|account_id| {
            let redemption = ctx.redemption.clone();
            let key = key.clone();
            tokio::spawn(async move { redemption.redeem(gamespace, account_id, &key).await })
        })
        .collect();

    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let not_found = results
        .iter()
        .filter(|r| matches!(r, Err(PromoError::CodeNotFound)))
        .count();

    assert_eq!(successes, 1, "恰好一个账号兑换成功");
    assert_eq!(not_found, 7, "其余账号都应看到码不可用");

    // 计数器归零且绝不为负
    let promo = ctx.redemption.find_code(gamespace, &key).await.unwrap();
    assert_eq!(promo.code_amount, 0);
    assert_eq!(count_usages(&ctx.pool, gamespace, promo.code_id).await, 1);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn concurrent_attempts_by_same_account_yield_one_success() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    seed_content(&ctx, gamespace, "gold", json!({"grant": 1})).await;
    let key = issue_code(&ctx, gamespace, 5, json!({"gold": 1})).await;

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let redemption = ctx.redemption.clone();
            let key = key.clone();
            tokio::spawn(async move { redemption.redeem(gamespace, 77, &key).await })
        })
        .collect();

    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(PromoError::AlreadyUsed)))
        .count();

    assert_eq!(successes, 1, "同一账号并发请求只能成功一次");
    assert_eq!(conflicts, 1, "另一个请求必须看到 AlreadyUsed");

    let promo = ctx.redemption.find_code(gamespace, &key).await.unwrap();
    assert_eq!(promo.code_amount, 4, "次数只被扣一次");
}

// ==================== 删除与回读 ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn delete_code_removes_usage_records() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    seed_content(&ctx, gamespace, "gold", json!({"grant": 1})).await;
    let key = issue_code(&ctx, gamespace, 5, json!({"gold": 1})).await;

    ctx.redemption.redeem(gamespace, 21, &key).await.unwrap();
    let promo = ctx.redemption.find_code(gamespace, &key).await.unwrap();

    ctx.redemption
        .delete_code(gamespace, promo.code_id)
        .await
        .expect("删除促销码失败");

    assert_eq!(
        count_usages(&ctx.pool, gamespace, promo.code_id).await,
        0,
        "使用记录应随促销码一起删除"
    );

    let result = ctx.redemption.redeem(gamespace, 22, &key).await;
    assert!(matches!(result, Err(PromoError::CodeNotFound)));
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn payload_round_trips_verbatim() {
    let ctx = setup().await;
    let gamespace = fresh_gamespace();

    // 嵌套结构体 + 数组 + unicode，确认负载原样透传
    let payload = json!({
        "items": [{"id": "sword-01", "rarity": "legendary"}, {"id": "shield-02"}],
        "meta": {"描述": "新手礼包", "weight": 0.5},
    });
    seed_content(&ctx, gamespace, "starter-pack", payload.clone()).await;
    let key = issue_code(&ctx, gamespace, 1, json!({"starter-pack": 2})).await;

    let rewards = ctx.redemption.redeem(gamespace, 31, &key).await.unwrap();

    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].payload, payload);
    assert_eq!(rewards[0].amount, 2);
}
