// ==================== INQUIRY NOTIFIER ====================
// Forwards a user question to the administrator and confirms it to the user

use std::sync::Arc;

use crate::models::{Inquiry, OutgoingMail};
use crate::services::mail_service::{MailError, Mailer};

const SIGNATURE: &str = "------------------------------------------------------
同志社大学大学院 理工学研究科 情報工学専攻
同志社大学 理工学部 情報システムデザイン学科
研究室配属希望調査管理チーム
------------------------------------------------------
";

pub const USER_SUBJECT: &str = "【研究室配属希望調査】お問い合わせの完了";

pub fn admin_subject(inquiry: &Inquiry) -> String {
    format!("研究室配属希望調査のお問い合わせ【{}さん】", inquiry.name)
}

/// Body sent to the administrator address.
pub fn admin_message(inquiry: &Inquiry) -> String {
    format!(
        "お問い合わせがありました。

お名前:
{name}

メールアドレス:
{email}

件名:
{subject}

内容:
{message}

頂いたメールアドレスと内容を元に、お問い合わせ内容の回答をお願いいたします。

** 注意事項 **
・このメールは、ユーザから研究室配属希望調査を経由して、自動的に送信されたメッセージになります。
・このメールに返信をしても、ユーザが確認することができません。
・問い合わせがあったユーザに、新規でメールを作成してください。

{signature}",
        name = inquiry.name,
        email = inquiry.email,
        subject = inquiry.subject,
        message = inquiry.message,
        signature = SIGNATURE,
    )
}

/// Acknowledgement sent back to the person who asked.
pub fn user_message(inquiry: &Inquiry) -> String {
    format!(
        "{name}さん

お問合せありがとうございます。
研究室希望配属調査管理チームでございます。

以下、問い合わせ内容となります。

件名:
{subject}

内容:
{message}

こちらの内容を元に、管理チームが回答をいたしますので、しばらくお待ち下さい。
お時間を頂き、大変恐縮ですが、よろしくお願いいたします。

** 注意事項 **
・このメールは、研究室配属希望調査を経由して、自動的に送信されたメッセージになります。
・このメールに返信をしても、管理チームが確認することができません。
・管理チームからのメールが来るまで、しばらくお待ちください。

{signature}",
        name = inquiry.name,
        subject = inquiry.subject,
        message = inquiry.message,
        signature = SIGNATURE,
    )
}

pub struct InquiryNotifier {
    mailer: Arc<dyn Mailer>,
    sender: String,
    admin_email: String,
}

impl InquiryNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, sender: String, admin_email: String) -> Self {
        Self {
            mailer,
            sender,
            admin_email,
        }
    }

    /// Sends the admin notification, then the user acknowledgement.
    /// Stops at the first failed send.
    pub async fn notify(&self, inquiry: &Inquiry) -> Result<(), MailError> {
        let admin = OutgoingMail {
            from: self.sender.clone(),
            to: self.admin_email.clone(),
            subject: admin_subject(inquiry),
            text: admin_message(inquiry),
        };

        let user = OutgoingMail {
            from: self.sender.clone(),
            to: inquiry.email.clone(),
            subject: USER_SUBJECT.to_string(),
            text: user_message(inquiry),
        };

        self.mailer.send(&admin).await?;
        self.mailer.send(&user).await?;

        log::info!("✅ Inquiry from {} forwarded to admin", inquiry.email);
        Ok(())
    }
}
