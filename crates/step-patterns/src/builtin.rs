//! Rules shipped with the engine.
//!
//! Buckets are scanned in [`ActionKind::ALL`] order, so a phrase that could read as
//! both an observation and an action must be disambiguated by the regexes here.

use itest_core_types::ActionKind;
use once_cell::sync::Lazy;

use crate::model::{Pattern, PatternDef, PatternOrigin};

/// Version tag of the builtin table, bumped whenever a rule changes meaning.
pub const BUILTIN_TABLE_VERSION: &str = "2";

static BUILTIN_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    builtin_definitions()
        .into_iter()
        .flat_map(|(kind, defs)| defs.into_iter().map(move |def| (kind, def)))
        .map(|(kind, def)| {
            Pattern::compile(kind, &def, PatternOrigin::Builtin).expect("builtin pattern")
        })
        .collect()
});

/// Compiled builtin rules in declaration order.
pub fn builtin_patterns() -> Vec<Pattern> {
    BUILTIN_PATTERNS.clone()
}

/// Declarative builtin table, grouped by bucket.
pub fn builtin_definitions() -> Vec<(ActionKind, Vec<PatternDef>)> {
    vec![
        (ActionKind::Goto, goto_rules()),
        (ActionKind::Extract, extract_rules()),
        (ActionKind::Observe, observe_rules()),
        (ActionKind::Agent, agent_rules()),
        (ActionKind::Act, act_rules()),
        (ActionKind::Template, template_rules()),
    ]
}

fn goto_rules() -> Vec<PatternDef> {
    vec![
        PatternDef::new(
            "basic_navigation",
            r"^(打开|访问|导航到)\s*(.*https?://.*)$",
            &["action", "url"],
            100,
            "基本导航操作",
        ),
        PatternDef::new(
            "simple_goto",
            r"^(?:转到|前往)\s*(.*https?://.*)$",
            &["url"],
            100,
            "简单导航",
        ),
        PatternDef::new(
            "refresh_page",
            r"^(刷新|重新加载)(?:\s*页面)?$",
            &["action"],
            100,
            "刷新页面",
        ),
        PatternDef::new(
            "go_back",
            r"^(返回|后退)(?:\s*(?:上一页|页面))?$",
            &["action"],
            100,
            "返回上一页",
        ),
        PatternDef::new(
            "open_url",
            r"^(?i)(open|visit|go to|navigate to)\s+(.*https?://.*)$",
            &["action", "url"],
            80,
            "Navigate to a URL",
        ),
        PatternDef::new(
            "reload_page",
            r"^(?i)(refresh|reload|go back|back)(?:\s+(?:the\s+)?page)?$",
            &["action"],
            80,
            "Reload the page or go back",
        ),
    ]
}

fn extract_rules() -> Vec<PatternDef> {
    vec![
        PatternDef::new(
            "extract_with_variable",
            r"^提取\s*(.+?)(?:\s*到变量\s*(\w+))?$",
            &["target", "variable"],
            100,
            "提取数据到变量",
        ),
        PatternDef::new(
            "get_and_save",
            r"^获取\s*(.+?)(?:\s*并保存为\s*(\w+))?$",
            &["target", "variable"],
            100,
            "获取并保存数据",
        ),
        PatternDef::new(
            "read_data",
            r"^读取\s*(.+?)(?:\s*存储到\s*(\w+))?$",
            &["target", "variable"],
            100,
            "读取数据",
        ),
        PatternDef::new(
            "capture_text",
            r"^捕获\s*(.+?)(?:文本)?(?:\s*到\s*(\w+))?$",
            &["target", "variable"],
            90,
            "捕获文本内容",
        ),
        PatternDef::new(
            "extract_into",
            r"^(?i)extract\s+(.+?)(?:\s+(?:into|as)\s+(\w+))?$",
            &["target", "variable"],
            80,
            "Extract data, optionally into a named variable",
        ),
    ]
}

fn observe_rules() -> Vec<PatternDef> {
    vec![
        PatternDef::new(
            "find_elements",
            r"^查找\s*(.+)$",
            &["target"],
            100,
            "查找元素",
        ),
        PatternDef::new(
            "observe_elements",
            r"^观察\s*(.+)$",
            &["target"],
            100,
            "观察元素",
        ),
        PatternDef::new(
            "check_elements",
            r"^检查\s*(.+?)\s*是否存在$",
            &["target"],
            100,
            "检查元素",
        ),
        PatternDef::new(
            "scan_page",
            r"^扫描\s*(.+)$",
            &["target"],
            90,
            "扫描页面",
        ),
        PatternDef::new(
            "find_en",
            r"^(?i)(?:find|observe)\s+(.+)$",
            &["target"],
            80,
            "Discover matching elements",
        ),
    ]
}

fn agent_rules() -> Vec<PatternDef> {
    vec![
        PatternDef::new(
            "execute_task",
            r"^执行任务\s*(.+)$",
            &["instruction"],
            100,
            "执行代理任务",
        ),
        PatternDef::new(
            "smart_execute",
            r"^智能执行\s*(.+)$",
            &["instruction"],
            100,
            "智能执行",
        ),
        PatternDef::new(
            "automate_workflow",
            r"^自动化\s*(.+)$",
            &["instruction"],
            100,
            "自动化工作流",
        ),
        PatternDef::new(
            "ai_assist",
            r"^AI辅助\s*(.+)$",
            &["instruction"],
            90,
            "AI辅助执行",
        ),
        PatternDef::new(
            "agent_task",
            r"^(?i)agent:\s*(.+)$",
            &["instruction"],
            80,
            "Delegate to an agent task",
        ),
    ]
}

fn act_rules() -> Vec<PatternDef> {
    vec![
        PatternDef::new(
            "input_text",
            r"^在\s*(.+?)\s*中输入\s*(.+)$",
            &["element", "value"],
            100,
            "在元素中输入文本",
        ),
        PatternDef::new(
            "click_element",
            r"^点击\s*(.+)$",
            &["element"],
            100,
            "点击元素",
        ),
        PatternDef::new(
            "select_option",
            r"^选择\s*(.+?)\s*中的\s*(.+)$",
            &["dropdown", "option"],
            100,
            "选择下拉选项",
        ),
        PatternDef::new(
            "select_from_dropdown",
            r"^从\s*(.+?)\s*中选择\s*(.+)$",
            &["dropdown", "option"],
            100,
            "从下拉框选择",
        ),
        PatternDef::new(
            "check_contains",
            r"^检查\s*(.+?)\s*是否包含\s*(.+)$",
            &["element", "expected"],
            100,
            "检查元素是否包含文本",
        )
        .with_template(r#"expect_text "${element}" "${expected}""#),
        PatternDef::new(
            "verify_display",
            r"^验证\s*(.+?)\s*显示\s*(.+)$",
            &["element", "expected"],
            100,
            "验证元素显示内容",
        )
        .with_template(r#"expect_text "${element}" "${expected}""#),
        PatternDef::new(
            "wait_for_element",
            r"^等待\s*(.+?)\s*出现$",
            &["element"],
            100,
            "等待元素出现",
        )
        .with_template(r#"wait_for "${element}""#),
        PatternDef::new(
            "take_screenshot",
            r"^截图\s*(.+)$",
            &["name"],
            100,
            "截图保存",
        ),
        PatternDef::new(
            "clear_input",
            r"^清空\s*(.+)$",
            &["element"],
            90,
            "清空输入框",
        ),
        PatternDef::new(
            "hover_element",
            r"^悬停\s*(.+)$",
            &["element"],
            90,
            "鼠标悬停",
        ),
        PatternDef::new(
            "scroll_to_element",
            r"^滚动到\s*(.+)$",
            &["element"],
            90,
            "滚动到元素",
        ),
        PatternDef::new(
            "click_en",
            r"^(?i)click(?:\s+on)?\s+(.+)$",
            &["element"],
            80,
            "Click an element",
        ),
    ]
}

fn template_rules() -> Vec<PatternDef> {
    vec![PatternDef::new(
        "assert_title",
        r"^(?:断言|确认)标题包含\s*(.+)$",
        &["expected"],
        100,
        "断言页面标题",
    )
    .with_template(r#"expect_title_contains "${expected}""#)]
}
