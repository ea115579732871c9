use super::CorreiosServiceResponse;
use regex::Regex;
use std::sync::OnceLock;

fn service_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<cServico>(.*?)</cServico>").expect("valid regex"))
}

fn element() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<(\w+)>\s*(?:<!\[CDATA\[(.*?)\]\]>|([^<]*))\s*</(\w+)>").expect("valid regex")
    })
}

/// Extracts the first `<cServico>` element of a CalcPrecoPrazo reply.
/// Returns `None` when the body carries no service element at all.
pub fn parse_service(body: &str) -> Option<CorreiosServiceResponse> {
    let block = service_block().captures(body)?.get(1)?.as_str();

    let mut service = CorreiosServiceResponse::default();
    for caps in element().captures_iter(block) {
        let (open, close) = (&caps[1], &caps[4]);
        if open != close {
            continue;
        }
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        match open {
            "Codigo" => service.codigo = value,
            "Valor" => service.valor = value,
            "PrazoEntrega" => service.prazo_entrega = value,
            "ValorSemAdicionais" => service.valor_sem_adicionais = value,
            "Erro" => service.erro = value,
            "MsgErro" => service.msg_erro = value,
            _ => {}
        }
    }
    Some(service)
}
