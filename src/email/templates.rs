pub fn render_recovery(username: &str, recovery_url: &str, ttl_minutes: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Account recovery</h2>
    <p>Hi {username},</p>
    <p>A password reset was requested for your account. Use the button below to choose a new password.</p>
    <p><a href="{recovery_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Reset password</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in {ttl_minutes} minutes and can be used once. If you didn't request it, you can ignore this email.</p>
</body>
</html>"#
    )
}
