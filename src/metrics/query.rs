use time::Date;

use crate::auth::claims::Role;

use super::dto::MetricsQuery;

/// Closed set of sortable columns. These names are the only strings that are
/// ever spliced into an ORDER BY clause; everything caller-supplied stays in
/// bind parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    AccountId,
    CampaignId,
    Clicks,
    Conversions,
    Impressions,
    Interactions,
    Date,
    CostMicros,
}

impl SortColumn {
    pub fn parse(s: &str) -> Option<SortColumn> {
        match s {
            "account_id" => Some(SortColumn::AccountId),
            "campaign_id" => Some(SortColumn::CampaignId),
            "clicks" => Some(SortColumn::Clicks),
            "conversions" => Some(SortColumn::Conversions),
            "impressions" => Some(SortColumn::Impressions),
            "interactions" => Some(SortColumn::Interactions),
            "date" => Some(SortColumn::Date),
            "cost_micros" => Some(SortColumn::CostMicros),
            _ => None,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortColumn::AccountId => "account_id",
            SortColumn::CampaignId => "campaign_id",
            SortColumn::Clicks => "clicks",
            SortColumn::Conversions => "conversions",
            SortColumn::Impressions => "impressions",
            SortColumn::Interactions => "interactions",
            SortColumn::Date => "date",
            SortColumn::CostMicros => "cost_micros",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// `asc` in any casing sorts ascending, anything else descending.
    pub fn parse(s: &str) -> SortDirection {
        if s.eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Validated request options plus the caller's projection rights. Both SQL
/// statements for a request are derived from one value, so the count and the
/// page always agree on the filter.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    order: Option<(SortColumn, SortDirection)>,
    pub page: i64,
    pub page_size: i64,
    pub include_cost: bool,
}

impl QuerySpec {
    pub fn new(params: &MetricsQuery, role: Role) -> QuerySpec {
        let include_cost = role.is_admin();

        // an out-of-set column falls back to the default order, and
        // cost_micros is only sortable by callers allowed to see it
        let column = params
            .sort
            .as_deref()
            .and_then(SortColumn::parse)
            .filter(|column| include_cost || *column != SortColumn::CostMicros);
        let order = column.map(|column| {
            let direction = params
                .order
                .as_deref()
                .map(SortDirection::parse)
                .unwrap_or_default();
            (column, direction)
        });

        QuerySpec {
            start_date: params.start_date,
            end_date: params.end_date,
            order,
            page: params.page.max(1),
            page_size: params.page_size.max(1),
            include_cost,
        }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Date bounds in the order they must be bound, shared by both
    /// statements.
    pub fn date_params(&self) -> impl Iterator<Item = Date> {
        self.start_date.into_iter().chain(self.end_date)
    }

    fn where_clause(&self, next_placeholder: &mut usize) -> String {
        let mut predicates = Vec::new();
        if self.start_date.is_some() {
            predicates.push(format!("date >= ${next_placeholder}"));
            *next_placeholder += 1;
        }
        if self.end_date.is_some() {
            predicates.push(format!("date <= ${next_placeholder}"));
            *next_placeholder += 1;
        }

        if predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", predicates.join(" AND "))
        }
    }

    pub fn count_sql(&self) -> String {
        let mut next_placeholder = 1;
        format!(
            "SELECT COUNT(*) FROM metrics{}",
            self.where_clause(&mut next_placeholder)
        )
    }

    pub fn page_sql(&self) -> String {
        let mut columns = String::from(
            "account_id, campaign_id, clicks, conversions, impressions, interactions, date",
        );
        if self.include_cost {
            columns.push_str(", cost_micros");
        }

        let mut next_placeholder = 1;
        let where_clause = self.where_clause(&mut next_placeholder);
        let (column, direction) = self
            .order
            .unwrap_or((SortColumn::Date, SortDirection::Desc));

        format!(
            "SELECT {columns} FROM metrics{where_clause} ORDER BY {} {} LIMIT ${} OFFSET ${}",
            column.as_sql(),
            direction.as_sql(),
            next_placeholder,
            next_placeholder + 1,
        )
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn params() -> MetricsQuery {
        MetricsQuery {
            start_date: None,
            end_date: None,
            sort: None,
            order: None,
            page: 1,
            page_size: 100,
        }
    }

    #[test]
    fn defaults_to_date_desc_without_filters() {
        let spec = QuerySpec::new(&params(), Role::User);

        assert_eq!(spec.count_sql(), "SELECT COUNT(*) FROM metrics");
        assert_eq!(
            spec.page_sql(),
            "SELECT account_id, campaign_id, clicks, conversions, impressions, interactions, \
             date FROM metrics ORDER BY date DESC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn admin_projection_includes_cost() {
        let spec = QuerySpec::new(&params(), Role::Admin);
        assert!(spec.include_cost);
        assert!(spec.page_sql().contains(", cost_micros FROM metrics"));

        let spec = QuerySpec::new(&params(), Role::User);
        assert!(!spec.include_cost);
        assert!(!spec.page_sql().contains("cost_micros"));
    }

    #[test]
    fn sort_and_order_are_honored() {
        let mut p = params();
        p.sort = Some("clicks".into());
        p.order = Some("asc".into());

        let spec = QuerySpec::new(&p, Role::User);
        assert!(spec.page_sql().contains("ORDER BY clicks ASC"));
    }

    #[test]
    fn order_is_case_insensitive_and_defaults_to_desc() {
        let mut p = params();
        p.sort = Some("impressions".into());

        p.order = Some("ASC".into());
        assert!(QuerySpec::new(&p, Role::User)
            .page_sql()
            .contains("ORDER BY impressions ASC"));

        p.order = Some("Desc".into());
        assert!(QuerySpec::new(&p, Role::User)
            .page_sql()
            .contains("ORDER BY impressions DESC"));

        p.order = Some("sideways".into());
        assert!(QuerySpec::new(&p, Role::User)
            .page_sql()
            .contains("ORDER BY impressions DESC"));

        p.order = None;
        assert!(QuerySpec::new(&p, Role::User)
            .page_sql()
            .contains("ORDER BY impressions DESC"));
    }

    #[test]
    fn hostile_sort_values_never_reach_the_sql() {
        let mut p = params();
        p.sort = Some("clicks; DROP TABLE metrics; --".into());
        p.order = Some("asc; DROP TABLE metrics".into());

        let sql = QuerySpec::new(&p, Role::Admin).page_sql();
        assert!(!sql.contains("DROP"));
        assert!(sql.contains("ORDER BY date DESC"));
    }

    #[test]
    fn cost_sort_needs_admin() {
        let mut p = params();
        p.sort = Some("cost_micros".into());

        let admin_sql = QuerySpec::new(&p, Role::Admin).page_sql();
        assert!(admin_sql.contains("ORDER BY cost_micros DESC"));

        let user_sql = QuerySpec::new(&p, Role::User).page_sql();
        assert!(user_sql.contains("ORDER BY date DESC"));
        assert!(!user_sql.contains("cost_micros"));
    }

    #[test]
    fn date_filters_share_placeholders_across_both_statements() {
        let mut p = params();
        p.start_date = Some(date!(2024 - 01 - 01));
        p.end_date = Some(date!(2024 - 01 - 31));

        let spec = QuerySpec::new(&p, Role::User);
        assert_eq!(
            spec.count_sql(),
            "SELECT COUNT(*) FROM metrics WHERE date >= $1 AND date <= $2"
        );
        let sql = spec.page_sql();
        assert!(sql.contains("WHERE date >= $1 AND date <= $2"));
        assert!(sql.ends_with("LIMIT $3 OFFSET $4"));

        let bound: Vec<Date> = spec.date_params().collect();
        assert_eq!(bound, vec![date!(2024 - 01 - 01), date!(2024 - 01 - 31)]);
    }

    #[test]
    fn single_bound_renumbers_placeholders() {
        let mut p = params();
        p.end_date = Some(date!(2024 - 01 - 31));

        let spec = QuerySpec::new(&p, Role::User);
        assert_eq!(
            spec.count_sql(),
            "SELECT COUNT(*) FROM metrics WHERE date <= $1"
        );
        assert!(spec.page_sql().ends_with("LIMIT $2 OFFSET $3"));

        let bound: Vec<Date> = spec.date_params().collect();
        assert_eq!(bound, vec![date!(2024 - 01 - 31)]);
    }

    #[test]
    fn pagination_math() {
        let mut p = params();
        p.page = 2;
        p.page_size = 10;
        let spec = QuerySpec::new(&p, Role::User);
        assert_eq!(spec.offset(), 10);

        p.page = 7;
        p.page_size = 25;
        assert_eq!(QuerySpec::new(&p, Role::User).offset(), 150);
    }

    #[test]
    fn offset_saturates_instead_of_overflowing() {
        let mut p = params();
        p.page = i64::MAX;
        p.page_size = 2;

        // a saturated offset is still a value Postgres accepts
        let spec = QuerySpec::new(&p, Role::User);
        assert_eq!(spec.offset(), i64::MAX);

        p.page_size = i64::MAX;
        assert_eq!(QuerySpec::new(&p, Role::User).offset(), i64::MAX);
    }

    #[test]
    fn page_and_size_are_clamped_to_one() {
        let mut p = params();
        p.page = 0;
        p.page_size = -5;

        let spec = QuerySpec::new(&p, Role::User);
        assert_eq!(spec.page, 1);
        assert_eq!(spec.page_size, 1);
        assert_eq!(spec.offset(), 0);

        p.page = -3;
        p.page_size = 0;
        let spec = QuerySpec::new(&p, Role::User);
        assert_eq!(spec.page, 1);
        assert_eq!(spec.page_size, 1);
        assert_eq!(spec.offset(), 0);
    }
}
