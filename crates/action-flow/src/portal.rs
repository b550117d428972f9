//! Where things live on the reimbursement portal

use action_locator::TableLayout;
use autofill_driver::Locator;
use serde::{Deserialize, Serialize};

/// URLs, labels and selectors of the target portal.
///
/// Every value can be overridden from configuration when the portal markup
/// changes; the defaults match the Element-UI reimbursement portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalLayout {
    pub base_url: String,
    /// Appended to `base_url` after login
    pub landing_path: String,
    pub username_placeholder: String,
    pub password_placeholder: String,
    pub login_button: String,
    pub create_button: String,
    pub dialog_name: String,
    pub category_placeholder: String,
    pub urgency_placeholder: String,
    pub comment_placeholder: String,
    pub business_dept_css: String,
    pub business_dept_placeholder: String,
    pub budget_dept_label: String,
    pub project_type_placeholder: String,
    pub project_placeholder: String,
    pub pay_company_label: String,
    pub option_css: String,
    pub input_css: String,
    pub add_row_css: String,
    pub upload_css: String,
    pub save_button: String,
    pub table: TableLayout,
}

impl Default for PortalLayout {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9086/".to_string(),
            landing_path: "#/reimbursement/employee".to_string(),
            username_placeholder: "请输入账号".to_string(),
            password_placeholder: "请输入密码".to_string(),
            login_button: "登录".to_string(),
            create_button: "新增".to_string(),
            dialog_name: "dialog".to_string(),
            category_placeholder: "请选择报销类型".to_string(),
            urgency_placeholder: "请选择紧急类型".to_string(),
            comment_placeholder: "请输入报销说明".to_string(),
            business_dept_css:
                "div.el-form-item.is-required.custom-form-render-item.custom-form-render-item-twoline"
                    .to_string(),
            business_dept_placeholder: "请选择".to_string(),
            budget_dept_label: "预算承担部门".to_string(),
            project_type_placeholder: "项目类型".to_string(),
            project_placeholder: "请选择项目/成本中心".to_string(),
            pay_company_label: "付款公司".to_string(),
            option_css: ".el-select-dropdown__item".to_string(),
            input_css: "input.el-input__inner".to_string(),
            add_row_css: "button:has-text(\"导出\") + button".to_string(),
            upload_css: "input.el-upload__input".to_string(),
            save_button: "保存".to_string(),
            table: TableLayout::default(),
        }
    }
}

impl PortalLayout {
    pub fn landing_url(&self) -> String {
        format!("{}{}", self.base_url, self.landing_path)
    }

    pub fn username(&self) -> Locator {
        Locator::by_placeholder(&self.username_placeholder)
    }

    pub fn password(&self) -> Locator {
        Locator::by_placeholder(&self.password_placeholder)
    }

    pub fn login_button(&self) -> Locator {
        Locator::by_role("button", &self.login_button)
    }

    pub fn create_button(&self) -> Locator {
        Locator::by_role("button", &self.create_button)
    }

    pub fn dialog(&self) -> Locator {
        Locator::by_role("dialog", &self.dialog_name)
    }

    pub fn category(&self) -> Locator {
        self.dialog().placeholder(&self.category_placeholder)
    }

    pub fn urgency(&self) -> Locator {
        self.dialog().placeholder(&self.urgency_placeholder)
    }

    pub fn comment(&self) -> Locator {
        Locator::by_placeholder(&self.comment_placeholder)
    }

    pub fn business_dept(&self) -> Locator {
        Locator::css(&self.business_dept_css).placeholder(&self.business_dept_placeholder)
    }

    pub fn budget_dept(&self) -> Locator {
        self.labelled_input(&self.budget_dept_label)
    }

    pub fn project_type(&self) -> Locator {
        self.dialog().placeholder(&self.project_type_placeholder)
    }

    pub fn project(&self) -> Locator {
        self.dialog().placeholder(&self.project_placeholder)
    }

    pub fn pay_company(&self) -> Locator {
        self.labelled_input(&self.pay_company_label)
    }

    /// Open dropdown options, shared by every Element-UI select on the page.
    pub fn options(&self) -> Locator {
        Locator::css(&self.option_css)
    }

    /// Elements showing `text`, used where the portal renders options as plain text.
    pub fn text_options(&self, text: &str, exact: bool) -> Locator {
        Locator::by_text(text, exact)
    }

    pub fn cell_input(&self, cell: &Locator) -> Locator {
        cell.find(&self.input_css)
    }

    pub fn add_row_button(&self) -> Locator {
        Locator::css(&self.add_row_css)
    }

    pub fn upload_input(&self) -> Locator {
        Locator::css(&self.upload_css)
    }

    pub fn save_button(&self) -> Locator {
        Locator::by_role("button", &self.save_button)
    }

    /// Input of a form item identified by its label span.
    fn labelled_input(&self, label: &str) -> Locator {
        Locator::css("span")
            .has_text(label)
            .parent()
            .parent()
            .find(&self.input_css)
    }
}
