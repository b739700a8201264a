use sqlx::MySqlPool;

/// Width of the numeric part of an employee code (`LAB000042`)
const CODE_PAD: usize = 6;

pub fn format_code(prefix: &str, number: u64) -> String {
    format!("{}{:0width$}", prefix, number, width = CODE_PAD)
}

#[derive(Debug, thiserror::Error)]
pub enum CodeError {
    #[error("no system code configuration found for {0}")]
    NotConfigured(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Claim the next employee code for a module type (LABOUR, CONTRACTOR, ...).
///
/// The increment and read happen inside one transaction so two concurrent
/// onboardings can never be handed the same code.
pub async fn next_code(pool: &MySqlPool, module_type: &str) -> Result<String, CodeError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, (String, u64)>(
        "SELECT prefix, last_number FROM system_codes WHERE module_type = ? FOR UPDATE",
    )
    .bind(module_type)
    .fetch_optional(&mut *tx)
    .await?;

    let (prefix, last_number) = match row {
        Some(r) => r,
        None => return Err(CodeError::NotConfigured(module_type.to_string())),
    };

    let next = last_number + 1;

    sqlx::query("UPDATE system_codes SET last_number = ? WHERE module_type = ?")
        .bind(next)
        .bind(module_type)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(format_code(&prefix, next))
}

#[cfg(test)]
mod tests {
    use super::format_code;

    #[test]
    fn codes_are_zero_padded() {
        assert_eq!(format_code("LAB", 1), "LAB000001");
        assert_eq!(format_code("LAB", 42), "LAB000042");
        assert_eq!(format_code("CON", 999999), "CON999999");
    }

    #[test]
    fn overflow_past_pad_width_keeps_digits() {
        assert_eq!(format_code("LAB", 1_000_000), "LAB1000000");
    }
}
