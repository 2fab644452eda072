use crate::db::adapter;
use crate::service::normalizer::fold_text;
use serde_json::Value;
use sqlx::PgPool;

/// Accented letters folded in SQL, paired position by position with
/// `SQL_FOLD_TO` as `translate()` arguments.
const SQL_FOLD_FROM: &str = "áàäâãåéèëêíìïîóòöôõúùüûñçýÿÁÀÄÂÃÅÉÈËÊÍÌÏÎÓÒÖÔÕÚÙÜÛÑÇÝ";
const SQL_FOLD_TO: &str = "aaaaaaeeeeiiiiooooouuuuncyyAAAAAAEEEEIIIIOOOOOUUUUNCY";

/// SQL twin of `normalizer::fold_text` for the letters in `SQL_FOLD_FROM`
fn fold_key_sql(expr: &str) -> String {
    format!(
        "btrim(regexp_replace(upper(translate({expr}, '{SQL_FOLD_FROM}', '{SQL_FOLD_TO}')), '[^0-9A-Z]+', ' ', 'g'))"
    )
}

/// SQL twin of `normalizer::rut_key`
fn rut_key_sql(expr: &str) -> String {
    format!("ltrim(upper(regexp_replace({expr}, '[^0-9A-Za-z]', '', 'g')), '0')")
}

/// Folded spellings of a field, bound as a `text[]` parameter
fn folded_names(names: &[&str]) -> Vec<String> {
    let mut folded: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let key = fold_text(name);
        if !folded.contains(&key) {
            folded.push(key);
        }
    }
    folded
}

/// True when some key of `data` folds to one of the names in `names_param`
/// and its text value satisfies `predicate` (written over `f.value`).
/// Keys are compared the way the record adapter compares them, so spelling
/// differences in case, accents or spacing do not hide a document.
fn any_field_sql(names_param: &str, predicate: &str) -> String {
    format!(
        "EXISTS (SELECT 1 FROM jsonb_each_text(data) AS f(key, value) WHERE {} = ANY({names_param}) AND {predicate})",
        fold_key_sql("f.key")
    )
}

/// Invoice documents for a set of canonical RUT keys
pub async fn fetch_invoice_documents(
    pool: &PgPool,
    rut_keys: &[String],
) -> Result<Vec<Value>, sqlx::Error> {
    let sql = format!(
        "SELECT data FROM docs WHERE {} ORDER BY id",
        any_field_sql("$2", &format!("{} = ANY($1)", rut_key_sql("f.value")))
    );
    sqlx::query_scalar::<_, Value>(&sql)
        .bind(rut_keys)
        .bind(folded_names(adapter::DEBTOR_ID))
        .fetch_all(pool)
        .await
}

/// Payment documents for a set of canonical RUT keys, in ingestion order
pub async fn fetch_payment_documents(
    pool: &PgPool,
    rut_keys: &[String],
    paid_only: bool,
) -> Result<Vec<Value>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT data FROM pagos
        WHERE {}
          AND (NOT $3 OR {})
        ORDER BY id
        "#,
        any_field_sql("$2", &format!("{} = ANY($1)", rut_key_sql("f.value"))),
        any_field_sql("$4", "upper(trim(f.value)) IN ('PAGADO', 'PAID')")
    );
    sqlx::query_scalar::<_, Value>(&sql)
        .bind(rut_keys)
        .bind(folded_names(adapter::DEBTOR_ID))
        .bind(paid_only)
        .bind(folded_names(adapter::STATUS))
        .fetch_all(pool)
        .await
}

/// Company registry document by canonical RUT key
pub async fn fetch_company_document(
    pool: &PgPool,
    rut_key: &str,
) -> Result<Option<Value>, sqlx::Error> {
    let sql = format!(
        "SELECT data FROM empresas WHERE {} ORDER BY id LIMIT 1",
        any_field_sql("$2", &format!("{} = $1", rut_key_sql("f.value")))
    );
    sqlx::query_scalar::<_, Value>(&sql)
        .bind(rut_key)
        .bind(folded_names(adapter::COMPANY_RUT))
        .fetch_optional(pool)
        .await
}

/// Company registry documents sharing sector and revenue bracket
pub async fn fetch_segment_documents(
    pool: &PgPool,
    sector: &str,
    bracket: &str,
) -> Result<Vec<Value>, sqlx::Error> {
    let sql = format!(
        "SELECT data FROM empresas WHERE {} AND {} ORDER BY id",
        any_field_sql("$3", "trim(f.value) = $1"),
        any_field_sql("$4", "trim(f.value) = $2")
    );
    sqlx::query_scalar::<_, Value>(&sql)
        .bind(sector)
        .bind(bracket)
        .bind(folded_names(adapter::COMPANY_SECTOR))
        .bind(folded_names(adapter::COMPANY_BRACKET))
        .fetch_all(pool)
        .await
}

/// Reference classification entry (category label) for a RUT
pub async fn fetch_reference_category(
    pool: &PgPool,
    rut_key: &str,
) -> Result<Option<String>, sqlx::Error> {
    let sql = format!(
        "SELECT categoria FROM clasificacion_entidades WHERE {} = $1 LIMIT 1",
        rut_key_sql("rut")
    );
    sqlx::query_scalar::<_, String>(&sql)
        .bind(rut_key)
        .fetch_optional(pool)
        .await
}
