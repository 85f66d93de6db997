fn main() {
    use pullxml::codec::Utf8Codec;
    use pullxml::token::TokenType;
    use pullxml::PullParser;

    let xml = "<tag1>text1</tag1><tag1>text2</tag1>\
               <tag1>text3</tag1><tag1><tag2>text4</tag2></tag1>";

    let mut parser = PullParser::<Utf8Codec>::new(xml.as_bytes().to_vec());
    let mut texts = Vec::new();

    loop {
        match parser.parse_next() {
            TokenType::Text if parser.current_tag_name() == b"tag2" => {
                let mut out = Vec::new();
                parser.current_value(Some(&mut out)).expect("cannot decode text value");
                texts.push(String::from_utf8(out).expect("decoded text is not valid UTF-8"));
                println!("{:?}", texts);
            }
            t if t.is_terminal() => break,
            _ => (),
        }
    }
}
