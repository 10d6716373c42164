//! Table definitions of the `贸易经营风险指标` (trade operation risk indicator) worksheet.
use crate::report::aggregate::{Aggregation, Reducer};
use crate::report::bucket::Bucketing;
use crate::report::categorize::SplitRule;
use crate::report::variant::{Comparison, ThresholdFilter};
use crate::report::{Pipeline, TableDefinition};
use crate::table::{Boundary, ColumnSpec, HeaderLocation, HeadingRule, HeadingScope, TableSpec};

/// Worksheet holding the risk indicator tables.
pub const SHEET_NAME: &str = "贸易经营风险指标";

pub const OVERDUE_REPAYMENT: &str = "一、逾期还款业务";
pub const OVERDUE_DELIVERY: &str = "二、付款逾期未到货(1)";
pub const OVERDUE_DELIVERY_IN_TRANSIT: &str = "三、付款逾期未到货(2、集港及在途部分)";
pub const RE_EXPORT_WITHOUT_LC: &str = "四、转口销售逾期未开证";
pub const CONTRACTED_NOT_DELIVERED: &str = "五、签约未到货";
pub const OVERDUE_SETTLEMENT: &str = "六、逾期未交货/未验收/未退质保金/未结算";
pub const OVERDUE_BID_BOND: &str = "七、投标保证金逾期退还表";
pub const SPOT_INVENTORY: &str = "八、现货敞口90天及以上库存";
pub const HEDGED_INVENTORY: &str = "九、期现结合90天及以上库存";
pub const DEPOSIT_RATIO: &str = "保证金比例";
pub const PRICE_INVERSION: &str = "价格倒挂";
pub const FORWARD_DELIVERY_RISK: &str = "远期交货风险汇总";

/// Reason codes of overdue amounts on cargo-controlled business.
const CARGO_CONTROL_REASONS: [&str; 2] = ["控货逾期未收款", "已出运未收汇（非OA）"];

fn heading(pattern: &str, scope: HeadingScope) -> HeadingRule {
    HeadingRule::new(pattern, scope).expect("Hardcode regex pattern")
}

fn contract_column() -> ColumnSpec {
    ColumnSpec::text("合同号", &["合同", "合同编号", "合同序号", "编号"])
}

fn group_column() -> ColumnSpec {
    ColumnSpec::text("板群", &["分板群", "业务板群"])
}

fn unit_column() -> ColumnSpec {
    ColumnSpec::text("经营单位", &["经营单位名称", "单位", "部门"])
}

fn product_column() -> ColumnSpec {
    ColumnSpec::text("产品", &["产品名称", "品名", "货物"])
}

fn amount_column() -> ColumnSpec {
    ColumnSpec::number(
        "金额/万元",
        &["金额", "金额(万元)", "金额（万元）", "逾期金额", "逾期金额/万元"],
    )
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

/// Overdue tables split by reason and bucketed by counterparty.
fn overdue_table(name: &str, pattern: &str, counterparty: ColumnSpec, plan: &str) -> TableDefinition {
    let entity = counterparty.name.to_owned();
    let spec = TableSpec::new(name)
        .heading(heading(pattern, HeadingScope::FirstCell))
        .required(vec![
            ColumnSpec::text("逾期事由", &["逾期原因", "事由", "原因"]),
            amount_column(),
            group_column(),
            unit_column(),
            counterparty,
            product_column(),
        ])
        .optional(vec![
            ColumnSpec::text(plan, &[]),
            ColumnSpec::text("集团在手(万元)", &[]),
            ColumnSpec::text("集团占用(万元)", &[]),
        ])
        .key_column(contract_column())
        .label_column("经营单位");
    let pipeline = Pipeline::Bucketed {
        fill_down: strings(&["板群"]),
        split: Some(SplitRule::new(
            "金额/万元",
            "逾期事由",
            &CARGO_CONTROL_REASONS,
            "控货类业务逾期金额",
            "授信类业务逾期金额",
        )),
        aggregation: Aggregation::new(
            &["板群", "经营单位", entity.as_str()],
            &[
                ("产品", Reducer::Join),
                ("金额/万元", Reducer::Sum),
                ("控货类业务逾期金额", Reducer::Sum),
                ("授信类业务逾期金额", Reducer::Sum),
                (plan, Reducer::Join),
                ("集团在手(万元)", Reducer::Join),
                ("集团占用(万元)", Reducer::Join),
            ],
        ),
        bucketing: Bucketing::new(
            &entity,
            "金额/万元",
            &["产品", plan, "集团在手(万元)", "集团占用(万元)"],
        ),
    };
    TableDefinition::new(spec, Some(pipeline))
}

fn spot_inventory() -> TableDefinition {
    let product = ColumnSpec::text("产品", &["品名", "货物", "产品名称", "商品"]);
    let spec = TableSpec::new(SPOT_INVENTORY)
        .heading(heading(r"八、\s*现货敞口90天及以上库存", HeadingScope::FirstCell))
        .required(vec![
            product.clone(),
            group_column(),
            unit_column(),
            ColumnSpec::text("库存地点", &["存放地点", "仓库", "仓储地点", "存储地点"]),
            ColumnSpec::number(
                "库存/万元",
                &["金额/万元", "金额", "库存金额", "库存金额/万元", "库存额", "库存额/万元"],
            ),
        ])
        .optional(vec![ColumnSpec::text("本周处理计划", &["处理计划", "本周计划", "计划"])])
        .key_column(product)
        .label_column("经营单位");
    let pipeline = Pipeline::Bucketed {
        fill_down: strings(&["板群"]),
        split: None,
        aggregation: Aggregation::new(
            &["板群", "经营单位", "库存地点"],
            &[
                ("产品", Reducer::Join),
                ("库存/万元", Reducer::Sum),
                ("本周处理计划", Reducer::Join),
            ],
        ),
        bucketing: Bucketing::new("库存地点", "库存/万元", &["产品", "本周处理计划"]),
    };
    TableDefinition::new(spec, Some(pipeline))
}

/// Tables that are extracted for review but not processed.
fn listed_table(name: &str, pattern: &str) -> TableDefinition {
    let spec = TableSpec::new(name).heading(heading(pattern, HeadingScope::FirstCell));
    TableDefinition::new(spec, None)
}

/// Ratio and risk tables whose title may sit in any column and whose header
/// row is found by its column names.
fn filtered_table(
    name: &str,
    pattern: &str,
    required: Vec<ColumnSpec>,
    optional: Vec<ColumnSpec>,
    filter: ThresholdFilter,
    default_threshold: f64,
) -> TableDefinition {
    let columns: Vec<String> = optional
        .iter()
        .chain(&required)
        .map(|column| column.name.to_owned())
        .collect();
    let tokens = vec!["经营单位".to_owned(), filter.column.to_owned()];
    let spec = TableSpec::new(name)
        .heading(heading(pattern, HeadingScope::AnyCell))
        .header(HeaderLocation::Tokens(tokens))
        .boundary(Boundary::NumericGap(filter.column.to_owned()))
        .required(required)
        .optional(optional)
        .label_column("经营单位");
    let pipeline = Pipeline::Filtered {
        columns,
        fill_down: "板群".to_owned(),
        filter,
        default_threshold,
    };
    TableDefinition::new(spec, Some(pipeline))
}

fn deposit_ratio() -> TableDefinition {
    filtered_table(
        DEPOSIT_RATIO,
        r"保证金比例(情况|统计|明细|汇总|表)",
        vec![
            unit_column(),
            ColumnSpec::number("合同金额/万元", &["合同金额", "合同金额(万元)"]),
            ColumnSpec::number("保证金比例", &["保证金比率", "比例"]),
        ],
        vec![group_column(), ColumnSpec::text("客户", &["客户名称", "购货单位"])],
        ThresholdFilter::new("保证金比例", Comparison::Greater),
        0.3,
    )
}

fn price_inversion() -> TableDefinition {
    filtered_table(
        PRICE_INVERSION,
        r"价格倒挂(情况|统计|明细|汇总|表)",
        vec![
            unit_column(),
            product_column(),
            ColumnSpec::number("倒挂金额", &["倒挂金额/万元", "倒挂金额(万元)"]),
        ],
        vec![
            group_column(),
            ColumnSpec::number("采购价", &["采购单价", "进价"]),
            ColumnSpec::number("销售价", &["销售单价", "售价"]),
        ],
        ThresholdFilter::new("倒挂金额", Comparison::Greater),
        0.0,
    )
}

fn forward_delivery_risk() -> TableDefinition {
    filtered_table(
        FORWARD_DELIVERY_RISK,
        r"远期交货风险汇总",
        vec![
            unit_column(),
            ColumnSpec::number("远期交货金额/万元", &["远期交货金额", "交货金额"]),
            ColumnSpec::number("距交货天数", &["剩余天数", "交货天数"]),
        ],
        vec![group_column(), ColumnSpec::text("客户", &["客户名称", "购货单位"]), product_column()],
        ThresholdFilter::new("距交货天数", Comparison::Less),
        30.0,
    )
}

/// All tables of the risk indicator worksheet in reading order.
pub fn risk_indicator_tables() -> Vec<TableDefinition> {
    vec![
        overdue_table(
            OVERDUE_REPAYMENT,
            r"一、\s*逾期还款业务",
            ColumnSpec::text("客户", &["客户名称", "客户名", "购货单位"]),
            "本周还款计划",
        ),
        overdue_table(
            OVERDUE_DELIVERY,
            r"二、\s*付款逾期未到货\(1\)",
            ColumnSpec::text("供应商", &["供应商名称", "供应商名", "供货单位"]),
            "本周到货计划",
        ),
        listed_table(OVERDUE_DELIVERY_IN_TRANSIT, r"三、\s*付款逾期未到货\(2、集港及在途部分\)"),
        listed_table(RE_EXPORT_WITHOUT_LC, r"四、\s*转口销售逾期未开证"),
        listed_table(CONTRACTED_NOT_DELIVERED, r"五、\s*签约未到货"),
        listed_table(OVERDUE_SETTLEMENT, r"六、\s*逾期未交货/未验收/未退质保金/未结算"),
        listed_table(OVERDUE_BID_BOND, r"七、\s*投标保证金逾期退还表"),
        spot_inventory(),
        listed_table(HEDGED_INVENTORY, r"九、\s*期现结合90天及以上库存"),
        deposit_ratio(),
        price_inversion(),
        forward_delivery_risk(),
    ]
}
