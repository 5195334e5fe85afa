//! Fixed assistant replies for local outcomes.

pub const GENERIC_FAILURE: &str =
    "Xin lỗi, đã xảy ra lỗi khi xử lý yêu cầu của bạn. Vui lòng thử lại sau.";

pub const PHONE_REQUIRED: &str = "Bạn cần nhập số điện thoại trước khi hỏi câu hỏi về nó. \
Hãy nhập một số điện thoại để tôi phân tích.";

pub const TWO_NUMBERS_REQUIRED: &str =
    "Để so sánh số điện thoại, vui lòng cung cấp ít nhất 2 số điện thoại.";

pub const NO_SPECIFIC_ANSWER: &str =
    "Đã xử lý câu hỏi của bạn, nhưng không tìm thấy câu trả lời cụ thể.";

pub const LOGIN_REQUIRED: &str = "Vui lòng đăng nhập để sử dụng tính năng này.";

pub const ANALYSIS_REJECTED: &str = "Không thể phân tích số điện thoại";

pub const QUESTION_REJECTED: &str = "Không thể trả lời câu hỏi";

pub const NO_MORE_HISTORY: &str = "Không còn dữ liệu để tải";

pub const HISTORY_LOAD_FAILED: &str = "Không thể tải lịch sử phân tích.";

pub const HISTORY_CLEAR_FAILED: &str = "Không thể xóa lịch sử phân tích.";

pub fn analyzed_number(phone_number: &str) -> String {
    format!("Đã phân tích số điện thoại {phone_number}.")
}

pub fn compared_numbers(phone_numbers: &[String]) -> String {
    format!(
        "Đã so sánh các số điện thoại: {}. Không tìm thấy thông tin chi tiết về so sánh.",
        phone_numbers.join(", ")
    )
}
